//! Client-side relevance ordering of search results.

use deeplibby_model::SearchResult;

/// Length of the longest common substring of `a` and `b`, by `char`.
pub fn longest_common_substring(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Rolling rows of the O(m*n) table.
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    let mut best = 0;
    for &ca in &a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb { previous[j] + 1 } else { 0 };
            best = best.max(current[j + 1]);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    best
}

/// Orders results by how directly they match the typed query, with
/// `library_count` breaking ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelevanceRanker;

impl RelevanceRanker {
    pub fn new() -> Self {
        Self
    }

    /// Best substring match of `query` (already lowercased) against the
    /// title, the creator names and the series label.
    pub fn score(&self, result: &SearchResult, query: &str) -> usize {
        let creators = result
            .creators
            .iter()
            .map(|creator| creator.name.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let series =
            format!("#{} {}", result.series_read_order, result.series_name);

        [result.title.as_str(), creators.as_str(), series.as_str()]
            .into_iter()
            .map(|field| {
                let padded = format!(" {} ", field.to_lowercase());
                longest_common_substring(query, &padded)
            })
            .max()
            .unwrap_or(0)
    }

    /// Stable sort by score, then library count, both descending.
    pub fn rank(
        &self,
        results: Vec<SearchResult>,
        query: &str,
    ) -> Vec<SearchResult> {
        let query = query.to_lowercase();
        let mut scored: Vec<(usize, SearchResult)> = results
            .into_iter()
            .map(|result| (self.score(&result, &query), result))
            .collect();
        scored.sort_by(|(score_a, a), (score_b, b)| {
            score_b
                .cmp(score_a)
                .then_with(|| b.library_count.cmp(&a.library_count))
        });
        scored.into_iter().map(|(_, result)| result).collect()
    }
}
