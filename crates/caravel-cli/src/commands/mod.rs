pub mod connectors;
pub mod run;
