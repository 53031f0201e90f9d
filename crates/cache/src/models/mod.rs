mod entry;
mod record;

pub use self::entry::Entry;
pub(crate) use self::entry::EntryRow;
pub use self::record::Record;
pub(crate) use self::record::RecordRow;
