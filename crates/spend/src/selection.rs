use dw_account::HistoryRow;

/// Greedy ascending-value coin selection (spec §4.G step 4): sorts the
/// candidate UTXOs by value ascending and accumulates until `required` is
/// met or exceeded. Deterministic for a given candidate set.
///
/// Returns the chosen inputs and the leftover change, or `None` if even all
/// candidates together fall short.
pub fn select<'a>(candidates: &[&'a HistoryRow], required: u64) -> Option<(Vec<&'a HistoryRow>, u64)> {
    let mut sorted: Vec<&HistoryRow> = candidates.to_vec();
    sorted.sort_by_key(|row| row.value);

    let mut total: u64 = 0;
    let mut chosen = Vec::new();
    for row in sorted {
        if total >= required {
            break;
        }
        total += row.value as u64;
        chosen.push(row);
    }

    if total < required {
        return None;
    }

    Some((chosen, total - required))
}
