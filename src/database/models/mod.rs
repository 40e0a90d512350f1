pub mod score_entry;
