/// Builder setters for request types.
///
/// - `setter!(name: Ty)` assigns anything convertible into `Ty`.
/// - `setter!(opt name: Ty)` wraps the value in `Some`.
/// - `setter!(opt body.name: Ty)` does the same on a nested payload struct.
/// - `setter!(update body.name: Ty)` takes a [`FieldUpdate`] as is, so callers
///   can forward `Unset` and `Clear` as well as a value.
///
/// [`FieldUpdate`]: crate::endpoints::FieldUpdate
macro_rules! setter {
    ($field:ident : $ty:ty) => {
        pub fn $field(mut self, $field: impl Into<$ty>) -> Self {
            self.$field = $field.into();
            self
        }
    };

    (opt $field:ident : $ty:ty) => {
        pub fn $field(mut self, $field: impl Into<$ty>) -> Self {
            self.$field = Some($field.into());
            self
        }
    };

    (opt $body:ident . $field:ident : $ty:ty) => {
        pub fn $field(mut self, $field: impl Into<$ty>) -> Self {
            self.$body.$field = Some($field.into());
            self
        }
    };

    (update $body:ident . $field:ident : $ty:ty) => {
        pub fn $field(mut self, $field: $crate::endpoints::FieldUpdate<$ty>) -> Self {
            self.$body.$field = $field;
            self
        }
    };
}

pub(crate) use setter;
