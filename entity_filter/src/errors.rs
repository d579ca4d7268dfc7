use table_mapper::MapperError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    /// Validation or filter removal before any filter was attached
    #[error("The filters are not defined in: {0}")]
    MissingFilterContext(String),

    #[error(transparent)]
    Entity(#[from] MapperError),
}

impl FilterError {
    pub fn missing_context<T: ?Sized>() -> Self {
        Self::MissingFilterContext(std::any::type_name::<T>().to_string())
    }
}
