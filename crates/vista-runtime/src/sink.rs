use vista_core::ResultRecord;

/// Receives the rows of a list request, one record at a time.
pub trait RowSink {
    /// Hand one record to the host. Returning `false` stops the request;
    /// the remaining rows are never read.
    fn push(&mut self, record: ResultRecord) -> bool;
}

impl<F> RowSink for F
where
    F: FnMut(ResultRecord) -> bool,
{
    fn push(&mut self, record: ResultRecord) -> bool {
        self(record)
    }
}
