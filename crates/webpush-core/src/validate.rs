//! Declarative validation kernel.
//!
//! A small internal DSL in the same spirit as cloudillo's settings and
//! ABAC registries: a process-wide, lazily-initialized set of compiled
//! rules, built once and reused for every request. Exact regexes follow
//! `webpush/validator.go`.

use std::sync::OnceLock;

use regex::Regex;

use crate::prelude::*;

/// One field/value check. `Rule::Custom` covers `mailto`, `origin`, and
/// `epoch_gt_now` — tags the Go original expressed as custom validator
/// functions registered on its validator instance.
#[derive(Debug, Clone)]
pub enum Rule<'a> {
	Required,
	Len(usize),
	Lte(i64),
	Gte(i64),
	OneOf(&'a [&'a str]),
	HttpUrl,
	Mailto,
	Origin,
	/// Value is an epoch-seconds timestamp; passes iff it is strictly in the future.
	EpochGtNow(i64),
}

struct Registry {
	mailto: Regex,
	origin: Regex,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
	REGISTRY.get_or_init(|| Registry {
		// mailto:<local>@<domain>.<tld>, tld at least 2 chars.
		mailto: Regex::new(r"^mailto:[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
			.unwrap_or_else(|e| unreachable_regex(e)),
		// scheme://host[:port], no path, no query, no fragment.
		origin: Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://[A-Za-z0-9.-]+(?::\d+)?$")
			.unwrap_or_else(|e| unreachable_regex(e)),
	})
}

/// The two patterns above are fixed string literals checked at authoring
/// time; if they ever fail to compile that's a programming error, not a
/// runtime condition, so this narrows to a readable panic message instead
/// of threading a `Result` through every call site.
#[cold]
fn unreachable_regex(e: regex::Error) -> Regex {
	unreachable!("static validator regex failed to compile: {e}")
}

pub fn is_mailto(value: &str) -> bool {
	registry().mailto.is_match(value)
}

pub fn is_origin(value: &str) -> bool {
	registry().origin.is_match(value)
}

pub fn is_http_url(value: &str) -> bool {
	url::Url::parse(value).is_ok_and(|u| u.scheme() == "http" || u.scheme() == "https")
}

/// Validates `value` against `rules` in order, stopping at the first
/// failure — matching the Go validator's "first error wins" behavior.
pub fn validate_str(field: &str, value: &str, rules: &[Rule]) -> ClResult<()> {
	for rule in rules {
		let ok = match rule {
			Rule::Required => !value.is_empty(),
			Rule::Len(n) => value.chars().count() == *n,
			Rule::Lte(n) => value.len() as i64 <= *n,
			Rule::Gte(n) => value.len() as i64 >= *n,
			Rule::OneOf(allowed) => value.is_empty() || allowed.contains(&value),
			Rule::HttpUrl => is_http_url(value),
			Rule::Mailto => is_mailto(value),
			Rule::Origin => is_origin(value),
			Rule::EpochGtNow(_) => true,
		};
		if !ok {
			return Err(Error::Validation(format!("{field}: failed {rule:?}")));
		}
	}
	Ok(())
}

pub fn validate_epoch_gt_now(field: &str, epoch_secs: i64, now_secs: i64) -> ClResult<()> {
	if epoch_secs > now_secs {
		Ok(())
	} else {
		Err(Error::Validation(format!("{field}: must be strictly in the future")))
	}
}
