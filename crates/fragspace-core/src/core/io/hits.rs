use crate::core::models::hit::Hit;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct HitRecord<'a> {
    key: &'a str,
    similarity: String,
    reaction: &'a str,
    synthons: String,
    product: &'a str,
}

/// Writes hits as CSV with a header row, in the order given.
pub fn write_hits_csv<W: Write>(hits: &[Hit], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for hit in hits {
        csv_writer.serialize(HitRecord {
            key: &hit.key,
            similarity: format!("{:.4}", hit.similarity),
            reaction: &hit.reaction_id,
            synthons: hit.synthons.join(";"),
            product: &hit.product,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}
