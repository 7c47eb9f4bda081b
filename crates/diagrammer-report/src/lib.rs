pub mod architecture;
pub mod circular;
pub mod diagram;
pub mod filter;
pub mod flows;
pub mod focus;
pub mod json;
pub mod markdown;
pub mod mermaid;
pub mod organize;
pub mod style;
pub mod text;
pub mod views;

pub use diagram::DiagramGenerator;
pub use organize::{organize_diagrams, render_index, Bucket, OrganizedDiagram};
