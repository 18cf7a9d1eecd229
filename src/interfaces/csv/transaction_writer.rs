use crate::domain::transaction::TransactionRecord;
use crate::error::Result;
use std::io::Write;

/// Writes transaction history as CSV.
///
/// Wraps `csv::Writer`; a header row is emitted before the first record.
pub struct TransactionWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TransactionWriter<W> {
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new().has_headers(true).from_writer(sink);
        Self { writer }
    }

    pub fn write_transactions<'a, I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a TransactionRecord>,
    {
        for record in records {
            self.writer.serialize(record)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
