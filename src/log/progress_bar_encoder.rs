//! While the day progress bar is drawn, a log line written over it would leave the tail of the
//! bar on screen. This encoder clears the line first.

use log::Record;
use log4rs::encode::{Encode, Write};

#[derive(Debug)]
pub struct ClearLineEncoder {
    inner: Box<dyn Encode>,
}

impl ClearLineEncoder {
    pub fn new(inner: Box<dyn Encode>) -> Self {
        Self { inner }
    }
}

impl Encode for ClearLineEncoder {
    fn encode(&self, w: &mut dyn Write, record: &Record) -> Result<(), anyhow::Error> {
        // Erase the line, cursor back to column zero.
        w.write_all(b"\x1B[2K\r")?;
        self.inner.encode(w, record)
    }
}
