//! CSV reports of simulation results.
//!
//! A report is a serializable row type registered with [`define_report!`]. Each registered
//! report type gets its own file, `<directory>/<prefix><short name>.csv`, and every call to
//! [`ContextReportExt::send_report`] appends (and flushes) one row. Sending a report of a type
//! that was never added is a no-op, so model code can emit rows unconditionally and leave the
//! choice of which files to write to the caller.
use std::any::TypeId;
use std::cell::RefCell;
use std::fs::{create_dir_all, File};
use std::path::PathBuf;

use csv::Writer;

use crate::context::{Context, ContextBase};
use crate::error::EpiError;
use crate::log::{error, trace};
use crate::{define_data_plugin, HashMap, HashMapExt};

pub trait Report: 'static {
    // Returns report type
    fn type_id(&self) -> TypeId;
    // Serializes the data with the correct writer
    fn serialize(&self, writer: &mut Writer<File>) -> Result<(), csv::Error>;
}

/// Implements [`Report`] for a `Serialize` row type.
#[macro_export]
macro_rules! define_report {
    ($name:ident) => {
        impl $crate::report::Report for $name {
            fn type_id(&self) -> std::any::TypeId {
                std::any::TypeId::of::<$name>()
            }

            fn serialize(
                &self,
                writer: &mut $crate::csv::Writer<std::fs::File>,
            ) -> Result<(), $crate::csv::Error> {
                writer.serialize(self)
            }
        }
    };
}
pub use define_report;

/// Where report files go and how they are named.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    file_prefix: String,
    output_dir: PathBuf,
    overwrite: bool,
}

impl ReportOptions {
    /// Defaults: no prefix, the current working directory, and refusing to overwrite.
    #[must_use]
    pub fn new() -> Self {
        ReportOptions {
            file_prefix: String::new(),
            output_dir: PathBuf::from("."),
            overwrite: false,
        }
    }

    pub fn file_prefix(&mut self, file_prefix: String) -> &mut ReportOptions {
        self.file_prefix = file_prefix;
        self
    }

    pub fn directory(&mut self, directory: PathBuf) -> &mut ReportOptions {
        self.output_dir = directory;
        self
    }

    pub fn overwrite(&mut self, overwrite: bool) -> &mut ReportOptions {
        self.overwrite = overwrite;
        self
    }

    fn path_for(&self, short_name: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}{}.csv", self.file_prefix, short_name))
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self::new()
    }
}

struct ReportData {
    file_writers: RefCell<HashMap<TypeId, Writer<File>>>,
    config: ReportOptions,
}

define_data_plugin!(
    ReportPlugin,
    ReportData,
    ReportData {
        file_writers: RefCell::new(HashMap::new()),
        config: ReportOptions::new(),
    }
);

// Creates the file and any missing parent directories.
fn create_report_file(options: &ReportOptions, short_name: &str) -> Result<File, EpiError> {
    let path = options.path_for(short_name);
    if path.exists() && !options.overwrite {
        return Err(EpiError::ReportError(format!(
            "{} already exists; pass --force-overwrite to replace it",
            path.display()
        )));
    }
    create_dir_all(&options.output_dir)?;
    trace!("creating report file {}", path.display());
    Ok(File::create(path)?)
}

pub trait ContextReportExt: ContextBase {
    /// Returns the options used to name report files. Changes only affect reports added
    /// afterwards.
    fn report_options(&mut self) -> &mut ReportOptions {
        &mut self.get_data_mut(ReportPlugin).config
    }

    /// Registers report type `T` and creates its file, named after `short_name`.
    ///
    /// # Errors
    ///
    /// Returns an `EpiError` if the file exists and overwriting is off, if `T` was already
    /// added, or if the file cannot be created.
    fn add_report<T: Report + 'static>(&mut self, short_name: &str) -> Result<(), EpiError> {
        let data_container = self.get_data_mut(ReportPlugin);
        if data_container
            .file_writers
            .borrow()
            .contains_key(&TypeId::of::<T>())
        {
            return Err(EpiError::ReportError(format!(
                "a report named {short_name} has already been added for this type"
            )));
        }
        let file = create_report_file(&data_container.config, short_name)?;
        data_container
            .file_writers
            .borrow_mut()
            .insert(TypeId::of::<T>(), Writer::from_writer(file));
        Ok(())
    }

    /// Writes one row to the file associated with the report's type. Does nothing if that type
    /// was never added.
    fn send_report<T: Report>(&self, report: T) {
        let Some(data_container) = self.try_get_data(ReportPlugin) else {
            return;
        };
        let mut writers = data_container.file_writers.borrow_mut();
        let Some(writer) = writers.get_mut(&report.type_id()) else {
            return;
        };
        let written = report
            .serialize(writer)
            .and_then(|()| writer.flush().map_err(csv::Error::from));
        if let Err(e) = written {
            error!("failed to write report row: {e}");
        }
    }
}

impl ContextReportExt for Context {}

#[cfg(test)]
mod test {
    use serde_derive::{Deserialize, Serialize};
    use tempfile::tempdir;

    use super::*;

    #[derive(Serialize, Deserialize)]
    struct SampleReport {
        id: u32,
        value: String,
    }

    define_report!(SampleReport);

    #[derive(Serialize, Deserialize)]
    struct OtherReport {
        day: usize,
    }

    define_report!(OtherReport);

    fn read_rows(path: PathBuf) -> Vec<SampleReport> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader.deserialize().map(Result::unwrap).collect()
    }

    #[test]
    fn add_and_send_report() {
        let mut context = Context::new();
        let temp_dir = tempdir().unwrap();
        context
            .report_options()
            .directory(temp_dir.path().to_path_buf());
        context.add_report::<SampleReport>("sample").unwrap();
        context.send_report(SampleReport {
            id: 1,
            value: "Value,1".to_string(),
        });
        context.send_report(SampleReport {
            id: 2,
            value: "Value\n2".to_string(),
        });

        let rows = read_rows(temp_dir.path().join("sample.csv"));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].value, "Value,1");
        assert_eq!(rows[1].value, "Value\n2");
    }

    #[test]
    fn prefix_and_nested_directory() {
        let mut context = Context::new();
        let temp_dir = tempdir().unwrap();
        let directory = temp_dir.path().join("nested").join("output");
        context
            .report_options()
            .directory(directory.clone())
            .file_prefix("run1_".to_string());
        context.add_report::<SampleReport>("sample").unwrap();
        context.send_report(SampleReport {
            id: 3,
            value: "x".to_string(),
        });
        assert!(directory.join("run1_sample.csv").exists());
    }

    #[test]
    fn existing_file_requires_overwrite() {
        let temp_dir = tempdir().unwrap();
        std::fs::write(temp_dir.path().join("sample.csv"), "old").unwrap();

        let mut context = Context::new();
        context
            .report_options()
            .directory(temp_dir.path().to_path_buf());
        let result = context.add_report::<SampleReport>("sample");
        assert!(matches!(result, Err(EpiError::ReportError(_))));

        let mut context = Context::new();
        context
            .report_options()
            .directory(temp_dir.path().to_path_buf())
            .overwrite(true);
        context.add_report::<SampleReport>("sample").unwrap();
        context.send_report(SampleReport {
            id: 9,
            value: "new".to_string(),
        });
        let rows = read_rows(temp_dir.path().join("sample.csv"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 9);
    }

    #[test]
    fn adding_twice_is_an_error() {
        let mut context = Context::new();
        let temp_dir = tempdir().unwrap();
        context
            .report_options()
            .directory(temp_dir.path().to_path_buf());
        context.add_report::<SampleReport>("sample").unwrap();
        assert!(context.add_report::<SampleReport>("sample_again").is_err());
    }

    #[test]
    fn send_report_without_adding_report_is_ignored() {
        let mut context = Context::new();
        context.send_report(SampleReport {
            id: 1,
            value: "ignored".to_string(),
        });

        let temp_dir = tempdir().unwrap();
        context
            .report_options()
            .directory(temp_dir.path().to_path_buf());
        context.add_report::<SampleReport>("sample").unwrap();
        context.send_report(OtherReport { day: 4 });
        assert!(!temp_dir.path().join("other.csv").exists());
    }
}
