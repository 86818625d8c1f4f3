//! Policy lookup tool
//!
//! Retrieval over a fixed, embedded FAQ document set. Sections are
//! scored by term overlap with the query and the top matches are
//! returned. Consulted before any write so the assistant does not
//! promise something policy forbids.

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{Tool, ToolContext, ToolResult};

/// Company policy sections, split the way the source FAQ is (`##` headings)
const POLICY_SECTIONS: &[&str] = &[
    "## Rebooking and flight changes\n\
     Tickets may be rebooked onto another flight operated by the airline up to \
     three hours before departure. Rebooking fees depend on the fare class: \
     Economy Light fares cannot be rebooked, Economy Flex and business fares \
     can be rebooked free of charge. A fare difference may apply.",
    "## Cancellations and refunds\n\
     Fully flexible tickets can be cancelled for a full refund before departure. \
     All other fares are refunded as a travel credit minus a processing fee. \
     Cancellations within 24 hours of booking are always free of charge.",
    "## Baggage allowance\n\
     Economy passengers may check one bag up to 23 kg; business passengers two \
     bags up to 32 kg each. Carry-on is limited to one bag of 8 kg plus one \
     personal item. Excess baggage is charged per additional kilogram.",
    "## Hotel and car partner bookings\n\
     Partner hotel and car rental bookings made through the airline can be \
     modified until 48 hours before check-in or pick-up. Later changes are \
     handled by the partner directly and may incur partner fees.",
    "## Check-in and boarding\n\
     Online check-in opens 23 hours before departure. Airport check-in counters \
     close 40 minutes before short-haul and 60 minutes before long-haul \
     departures. Boarding closes 15 minutes before departure.",
];

/// How many sections a lookup returns
const TOP_K: usize = 2;

fn terms(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(str::to_string)
        .collect()
}

/// Score a section by query-term overlap
fn score(section: &str, query_terms: &[String]) -> usize {
    let section_terms = terms(section);
    query_terms.iter().filter(|qt| section_terms.contains(qt)).count()
}

/// Rank sections against a query, best first, zero-score sections dropped
pub(crate) fn rank_sections(query: &str) -> Vec<&'static str> {
    let query_terms = terms(query);
    let mut scored: Vec<(usize, &&str)> = POLICY_SECTIONS
        .iter()
        .map(|s| (score(s, &query_terms), s))
        .filter(|(n, _)| *n > 0)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(TOP_K).map(|(_, s)| *s).collect()
}

/// Consult company policy before performing write actions
pub struct LookupPolicyTool;

#[async_trait]
impl Tool for LookupPolicyTool {
    fn name(&self) -> &'static str {
        "lookup_policy"
    }

    fn description(&self) -> &'static str {
        "Consult the company policies to check whether certain options are permitted. \
         Use this before making any flight changes or performing other write events."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "What to look up in the policy documents" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: Value, _ctx: &ToolContext) -> ToolResult {
        let Some(query) = input["query"].as_str() else {
            return ToolResult::error("query is required");
        };

        let sections = rank_sections(query);
        if sections.is_empty() {
            return ToolResult::success("No policy section matched the query.");
        }

        ToolResult::success(sections.join("\n\n"))
    }
}
