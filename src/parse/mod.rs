pub mod convention;
pub mod wiki_link;

pub use convention::{
    DateName, INDEX_NOTE, SequenceName, child_name, format_date_name, format_sequence_name,
    is_history_excluded, parse_date_name, parse_sequence_name,
};
pub use wiki_link::{WikiLink, find_links, link_at};
