// Pipeline storage: workbook export and reload

pub mod xlsx;

pub use xlsx::{read_sheet, write_merged, write_source_table, Cell, SheetTable};
