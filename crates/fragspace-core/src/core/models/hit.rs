use std::cmp::Ordering;
use std::collections::HashMap;

pub const KEY_SEPARATOR: &str = "____";

/// A product predicted to resemble the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// `product____synthon1____...____synthonN____reaction`
    pub key: String,
    pub product: String,
    /// Synthon ids in position order.
    pub synthons: Vec<String>,
    pub reaction_id: String,
    pub similarity: f64,
}

impl Hit {
    pub fn new(product: &str, synthons: Vec<String>, reaction_id: &str, similarity: f64) -> Self {
        let key = Self::key_for(product, &synthons, reaction_id);
        Self {
            key,
            product: product.to_string(),
            synthons,
            reaction_id: reaction_id.to_string(),
            similarity,
        }
    }

    pub fn key_for(product: &str, synthons: &[String], reaction_id: &str) -> String {
        let mut key = String::from(product);
        for synthon in synthons {
            key.push_str(KEY_SEPARATOR);
            key.push_str(synthon);
        }
        key.push_str(KEY_SEPARATOR);
        key.push_str(reaction_id);
        key
    }
}

/// Hits deduplicated by key; a repeated key keeps its best-scoring occurrence.
#[derive(Debug, Clone, Default)]
pub struct HitList {
    by_key: HashMap<String, Hit>,
}

impl HitList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the hit was new or improved an existing entry.
    pub fn offer(&mut self, hit: Hit) -> bool {
        match self.by_key.get_mut(&hit.key) {
            Some(existing) if existing.similarity >= hit.similarity => false,
            Some(existing) => {
                *existing = hit;
                true
            }
            None => {
                self.by_key.insert(hit.key.clone(), hit);
                true
            }
        }
    }

    pub fn merge(&mut self, other: HitList) {
        for hit in other.by_key.into_values() {
            self.offer(hit);
        }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Hit> {
        self.by_key.get(key)
    }

    /// Descending similarity, ties broken by key.
    pub fn into_sorted(self) -> Vec<Hit> {
        let mut hits: Vec<Hit> = self.by_key.into_values().collect();
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });
        hits
    }

    /// Key and score pairs in the order of [`HitList::into_sorted`].
    pub fn into_map(self) -> Vec<(String, f64)> {
        self.into_sorted()
            .into_iter()
            .map(|hit| (hit.key, hit.similarity))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(product: &str, synthons: &[&str], similarity: f64) -> Hit {
        Hit::new(
            product,
            synthons.iter().map(|s| s.to_string()).collect(),
            "amide",
            similarity,
        )
    }

    #[test]
    fn key_joins_product_synthons_and_reaction() {
        let h = hit("CCNC(C)=O", &["a1", "b2"], 0.7);
        assert_eq!(h.key, "CCNC(C)=O____a1____b2____amide");
    }

    #[test]
    fn offer_keeps_maximum_for_repeated_key() {
        let mut list = HitList::new();
        assert!(list.offer(hit("P", &["a", "b"], 0.6)));
        assert!(list.offer(hit("P", &["a", "b"], 0.8)));
        assert!(!list.offer(hit("P", &["a", "b"], 0.7)));
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("P____a____b____amide").unwrap().similarity, 0.8);
    }

    #[test]
    fn into_sorted_orders_by_descending_similarity_then_key() {
        let mut list = HitList::new();
        list.offer(hit("P1", &["a"], 0.5));
        list.offer(hit("P3", &["c"], 0.9));
        list.offer(hit("P2", &["b"], 0.9));
        let keys: Vec<String> = list.into_sorted().into_iter().map(|h| h.key).collect();
        assert_eq!(keys, vec!["P2____b____amide", "P3____c____amide", "P1____a____amide"]);
    }

    #[test]
    fn merge_combines_lists_keeping_best_scores() {
        let mut first = HitList::new();
        first.offer(hit("P", &["a"], 0.4));
        let mut second = HitList::new();
        second.offer(hit("P", &["a"], 0.6));
        second.offer(hit("Q", &["b"], 0.5));
        first.merge(second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.get("P____a____amide").unwrap().similarity, 0.6);
    }

    #[test]
    fn into_map_pairs_keys_with_scores_in_rank_order() {
        let mut list = HitList::new();
        list.offer(hit("P", &["a"], 0.3));
        list.offer(hit("Q", &["b"], 0.8));
        assert_eq!(
            list.into_map(),
            vec![
                ("Q____b____amide".to_string(), 0.8),
                ("P____a____amide".to_string(), 0.3)
            ]
        );
    }
}
