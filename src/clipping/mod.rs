pub(crate) mod bounds;
pub(crate) mod channel;
pub(crate) mod context;
pub(crate) mod manager;
pub(crate) mod matrix;
