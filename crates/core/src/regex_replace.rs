use regex::Regex;

/// Replaces matches of `regex` in `input`, expanding `$n` capture references
/// in `replacement`.
///
/// `limit == 0` replaces every match, a positive limit only the first `limit`
/// matches and a negative limit only the last `|limit|` matches.
pub fn regex_replace(regex: &Regex, input: &str, replacement: &str, limit: i64) -> String {
    if limit >= 0 {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        return regex.replacen(input, limit, replacement).into_owned();
    }

    let total = regex.find_iter(input).count();
    let keep = usize::try_from(limit.unsigned_abs()).unwrap_or(usize::MAX);
    let first_replaced = total.saturating_sub(keep);

    let mut output = String::with_capacity(input.len());
    let mut last_end = 0;
    for (i, caps) in regex.captures_iter(input).enumerate() {
        if i < first_replaced {
            continue;
        }
        let Some(whole) = caps.get(0) else {
            continue;
        };
        output.push_str(&input[last_end..whole.start()]);
        caps.expand(replacement, &mut output);
        last_end = whole.end();
    }
    output.push_str(&input[last_end..]);
    output
}
