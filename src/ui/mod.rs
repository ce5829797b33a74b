//! Console front end for DocuHub

pub mod console;
pub mod explorer;
pub mod preview;
