//! Leaf tool implementations

pub mod text;
pub mod search;
pub mod wikipedia;
pub mod arxiv;
pub mod url;
pub mod weather;
pub mod wolfram;
pub mod python;
pub mod calculator;
pub mod units;
pub mod equation;
pub mod chart;

// Re-export for convenience
pub use arxiv::ArxivSearchTool;
pub use calculator::CalculatorTool;
pub use chart::ChartTool;
pub use equation::EquationSolverTool;
pub use python::PythonReplTool;
pub use search::{NewsSearchTool, WebSearchTool};
pub use units::UnitConverterTool;
pub use url::FetchUrlTool;
pub use weather::WeatherTool;
pub use wikipedia::WikipediaTool;
pub use wolfram::WolframAlphaTool;
