use std::fmt;

use regex::RegexSet;
use serde::{Deserialize, Serialize};

use crate::Passage;

/// Score added for every boost rule a passage satisfies.
pub const BOOST_INCREMENT: u32 = 3;

/// Classification rules in priority order. The first category with any matching pattern wins,
/// so a query naming both Windows and DNS resolves to `Windows`.
pub const CATEGORY_RULES: &[(Category, &[&str])] = &[
	(
		Category::Windows,
		&[
			"cmd",
			"powershell",
			"event viewer",
			"win",
			"windows",
			"gpupdate",
			"registry",
			"dll",
			"task manager",
		],
	),
	(
		Category::Linux,
		&[
			"systemctl",
			"sudo",
			"apt",
			"yum",
			"journalctl",
			"chmod",
			"chown",
			"linux",
			"ubuntu",
			"centos",
		],
	),
	(
		Category::Networking,
		&[
			"ipconfig", "ifconfig", "wifi", "dns", "dhcp", "gateway", "router", "internet", "ping",
			"tracert",
		],
	),
	(
		Category::ActiveDirectory,
		&["ad", "domain", "gpo", "ou", "ldap", "group policy", "dc", "forest"],
	),
	(Category::Hardware, &["cpu", "gpu", "ram", "ssd", "hdd", "temperature", "overheating", "fan"]),
	(Category::Devices, &["printer", "usb", "keyboard", "mouse", "driver", "display", "monitor"]),
];

/// Passage boost rules: `(categories the rule applies to, keywords)`. A rule fires when any of its
/// keywords is a substring of the lower-cased passage.
pub const BOOST_RULES: &[(&[Category], &[&str])] = &[
	(&[Category::Windows, Category::Networking], &["windows"]),
	(&[Category::Linux], &["linux"]),
	(&[Category::Networking], &["dns", "ip", "wifi"]),
	(&[Category::ActiveDirectory], &["domain", "ad", "gpo"]),
	(&[Category::Hardware], &["cpu", "gpu", "temp"]),
	(&[Category::Devices], &["printer", "usb"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
	Windows,
	Linux,
	Networking,
	ActiveDirectory,
	Hardware,
	Devices,
	General,
}
impl Category {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Windows => "windows",
			Self::Linux => "linux",
			Self::Networking => "networking",
			Self::ActiveDirectory => "active_directory",
			Self::Hardware => "hardware",
			Self::Devices => "devices",
			Self::General => "general",
		}
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Keyword classifier and coarse re-ranker layered on top of semantic reranking.
///
/// Patterns are compiled once; the booster is read-only afterwards and safe to share across
/// requests.
#[derive(Debug)]
pub struct CategoryBooster {
	matchers: Vec<(Category, RegexSet)>,
}
impl CategoryBooster {
	pub fn new() -> Result<Self, regex::Error> {
		let mut matchers = Vec::with_capacity(CATEGORY_RULES.len());

		for (category, patterns) in CATEGORY_RULES {
			let set = RegexSet::new(patterns.iter())?;

			matchers.push((*category, set));
		}

		Ok(Self { matchers })
	}

	/// Patterns are lower-case, so the query is lower-cased before matching.
	pub fn classify(&self, query: &str) -> Category {
		let lowered = query.to_lowercase();

		self.matchers
			.iter()
			.find(|(_, set)| set.is_match(&lowered))
			.map(|(category, _)| *category)
			.unwrap_or(Category::General)
	}

	/// Reorders passages by category affinity. Equal scores keep their incoming order.
	pub fn boost(&self, query: &str, passages: Vec<Passage>) -> Vec<Passage> {
		self.boost_for(self.classify(query), passages)
	}

	/// Same as [`Self::boost`] for a category the caller already derived.
	pub fn boost_for(&self, category: Category, passages: Vec<Passage>) -> Vec<Passage> {
		let mut scored: Vec<(u32, Passage)> = passages
			.into_iter()
			.map(|passage| (affinity(category, &passage.content), passage))
			.collect();

		scored.sort_by(|a, b| b.0.cmp(&a.0));

		scored.into_iter().map(|(_, passage)| passage).collect()
	}
}

pub fn affinity(category: Category, content: &str) -> u32 {
	let lowered = content.to_lowercase();
	let mut score = 0;

	for (categories, keywords) in BOOST_RULES {
		if !categories.contains(&category) {
			continue;
		}
		if keywords.iter().any(|keyword| lowered.contains(keyword)) {
			score += BOOST_INCREMENT;
		}
	}

	score
}
