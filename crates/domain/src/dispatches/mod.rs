/// Dispatch note and its lines
pub mod aggregate;

/// Form transitions
pub mod form;

/// Input DTOs
pub mod inputs;

/// Guide numbering
pub mod numbering;

/// PDF rendering
pub mod pdf;

/// Form actions wired to the store
pub mod services;

/// Dispatch log writer
pub mod writer;

pub use aggregate::{is_dispatch_pdf, Dispatch, DispatchLine, GuideNumber, Office};
pub use inputs::{FormState, GridRow};
pub use numbering::next_guide_number;
pub use services::{PdfOutcome, SaveOutcome, Services};
pub use writer::{ensure_log, save_dispatch, LOG_HEADER};
