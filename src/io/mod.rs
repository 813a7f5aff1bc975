mod document;
mod export;
mod spreadsheet;

pub use export::Exporter;
