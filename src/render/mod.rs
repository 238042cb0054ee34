pub(crate) mod passes;
pub(crate) mod plan;
pub(crate) mod renderer;
