use crate::controller::ChartState;

pub type Result<T> = std::result::Result<T, ChartError>;

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error(transparent)]
    Core(#[from] ledgerflow_core::Error),

    #[error(transparent)]
    Render(#[from] ledgerflow_render::Error),

    /// A required module failed to construct; the chart was never usable.
    #[error("module `{module}` failed to initialize: {message}")]
    ModuleInitialization {
        module: &'static str,
        message: String,
    },

    #[error("export failed: {message}")]
    Export { message: String },

    #[error("nothing has been rendered yet")]
    NotRendered,

    #[error("operation not allowed while the chart is {state}")]
    InvalidState { state: ChartState },

    #[error("unknown node `{id}`")]
    UnknownNode { id: String },

    #[error("`{operation}` is not supported by {kind} charts")]
    Unsupported {
        operation: &'static str,
        kind: &'static str,
    },
}

impl ChartError {
    pub(crate) fn export(message: impl Into<String>) -> Self {
        Self::Export {
            message: message.into(),
        }
    }
}
