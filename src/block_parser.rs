use crate::{EditBlock, EditBlocks};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static RE_SEARCH_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(<+)\s*SEARCH\s*$").unwrap());
static RE_REPLACE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(>+)\s*REPLACE\s*$").unwrap());
static RE_DIVIDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*={7}\s*$").unwrap());

/// File extensions accepted by the file-path line heuristic when the line
/// carries no path separator.
const KNOWN_EXTS: &[&str] = &[
	"rs", "ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "go", "java", "kt", "c", "h", "cc", "cpp", "hpp", "cs",
	"rb", "php", "swift", "scala", "sh", "bash", "zsh", "md", "txt", "json", "toml", "yaml", "yml", "xml", "html",
	"htm", "css", "scss", "less", "sql", "vue", "svelte", "lock", "cfg", "conf", "ini", "env",
];

/// Marker vocabulary of one SEARCH/REPLACE pair.
///
/// Both forms share the `=======` divider; the opening marker determines
/// which closing marker terminates the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerStyle {
	/// `<<<<<<< SEARCH` / `>>>>>>> REPLACE`
	Full,
	/// `<<< SEARCH` / `>>> REPLACE`
	Compact,
}

/// Parses raw assistant text into an ordered list of [`EditBlock`]s.
///
/// The text may interleave prose, file-path lines, code fences, and
/// SEARCH/REPLACE pairs in either marker vocabulary. Blocks with no explicit
/// file-path line fall back to `default_path`, then to the literal `"unknown"`.
///
/// Malformed marker sequences (unterminated SEARCH, missing `=======`) stop
/// the scan at that point; blocks collected before the malformed sequence are
/// still returned. This function never fails.
pub fn parse_edit_blocks(input: &str, default_path: Option<&str>) -> EditBlocks {
	let lines: Vec<&str> = input.lines().collect();
	let mut blocks = Vec::new();
	let mut current_path: Option<String> = None;

	let mut i = 0;
	while i < lines.len() {
		let line = lines[i];

		if let Some(style) = search_marker_style(line) {
			// -- Find the divider, then the matching closing marker
			let Some(div_idx) = ((i + 1)..lines.len()).find(|&j| RE_DIVIDER.is_match(lines[j])) else {
				warn!("search marker at line {} has no '=======' divider, stopping parse", i + 1);
				break;
			};
			let Some(end_idx) = ((div_idx + 1)..lines.len()).find(|&j| is_replace_marker(lines[j], style)) else {
				warn!("search marker at line {} has no closing REPLACE marker, stopping parse", i + 1);
				break;
			};

			let search_lines = strip_blank_edges(&lines[i + 1..div_idx]);
			let replace_lines = strip_blank_edges(&lines[div_idx + 1..end_idx]);

			if !(search_lines.is_empty() && replace_lines.is_empty()) {
				let file_path = current_path
					.clone()
					.or_else(|| default_path.map(|p| p.to_string()))
					.unwrap_or_else(|| "unknown".to_string());
				blocks.push(EditBlock::new(file_path, search_lines, replace_lines));
			}

			i = end_idx + 1;
			continue;
		}

		// -- Outside a block, look for a file-path line
		if let Some(path) = file_path_from_line(line) {
			current_path = Some(path);
		}

		i += 1;
	}

	EditBlocks::new(blocks)
}

// region:    --- Support

fn search_marker_style(line: &str) -> Option<MarkerStyle> {
	let caps = RE_SEARCH_MARKER.captures(line)?;
	match caps[1].len() {
		7 => Some(MarkerStyle::Full),
		3 => Some(MarkerStyle::Compact),
		_ => None,
	}
}

fn is_replace_marker(line: &str, style: MarkerStyle) -> bool {
	let Some(caps) = RE_REPLACE_MARKER.captures(line) else {
		return false;
	};
	let expected = match style {
		MarkerStyle::Full => 7,
		MarkerStyle::Compact => 3,
	};
	caps[1].len() == expected
}

fn is_marker_line(line: &str) -> bool {
	RE_SEARCH_MARKER.is_match(line) || RE_REPLACE_MARKER.is_match(line) || RE_DIVIDER.is_match(line)
}

fn is_fence_line(line: &str) -> bool {
	line.trim_start().starts_with("```")
}

/// Strips leading/trailing blank lines; internal blank lines are preserved exactly.
fn strip_blank_edges(lines: &[&str]) -> Vec<String> {
	let Some(start) = lines.iter().position(|l| !l.trim().is_empty()) else {
		return Vec::new();
	};
	let Some(end) = lines.iter().rposition(|l| !l.trim().is_empty()) else {
		return Vec::new();
	};
	lines[start..=end].iter().map(|s| s.to_string()).collect()
}

/// Extracts a file path from a candidate line, or `None` when the line does
/// not look like one.
///
/// Heuristics: contains `/` or `\`, or ends with a known extension; is a
/// single token once an optional `File:` label and markdown dressing are
/// stripped; and is not a marker or fence line.
fn file_path_from_line(line: &str) -> Option<String> {
	let trimmed = line.trim();
	if trimmed.is_empty() || is_marker_line(trimmed) || is_fence_line(trimmed) {
		return None;
	}

	let mut candidate = trimmed;
	for label in ["File:", "file:", "FILE:"] {
		if let Some(rest) = candidate.strip_prefix(label) {
			candidate = rest.trim();
			break;
		}
	}

	let candidate = candidate
		.trim_end_matches(':')
		.trim_matches(|c| c == '`' || c == '*' || c == '"')
		.trim();

	if candidate.is_empty() || candidate.contains(char::is_whitespace) {
		return None;
	}

	let has_separator = candidate.contains('/') || candidate.contains('\\');
	let has_known_ext = candidate
		.rsplit_once('.')
		.map(|(_, ext)| KNOWN_EXTS.contains(&ext.to_ascii_lowercase().as_str()))
		.unwrap_or(false);

	if has_separator || has_known_ext {
		Some(candidate.to_string())
	} else {
		None
	}
}

// endregion: --- Support

// region:    --- Tests


// endregion: --- Tests
