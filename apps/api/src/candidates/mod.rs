// Candidate profile access. Ingestion owns the writes; this side only reads.

pub mod store;
