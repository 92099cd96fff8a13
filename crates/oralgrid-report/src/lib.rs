//! oralgrid-report — Results views rendered as HTML or Markdown.

pub mod html;
pub mod markdown;
pub mod view;

pub use view::ResultsView;
