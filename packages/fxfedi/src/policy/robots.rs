//! Robots.txt parser and checker.
//!
//! Fetching is fail-open: an unreachable or broken robots.txt never blocks a
//! request.

use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::traits::fetcher::Fetcher;

/// One `Allow`/`Disallow` line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    pattern: String,
    allow: bool,
}

/// Allow and disallow patterns of one user-agent, in file order.
#[derive(Debug, Clone, Default)]
pub struct AgentRules {
    rules: Vec<Rule>,
}

impl AgentRules {
    fn merge(&mut self, other: &AgentRules) {
        self.rules.extend(other.rules.iter().cloned());
    }

    /// Longest matching pattern wins; an `Allow` wins a tie.
    fn is_allowed(&self, path: &str) -> bool {
        let mut best: Option<(usize, bool)> = None;
        for rule in &self.rules {
            if !pattern_matches(&rule.pattern, path) {
                continue;
            }
            let len = rule.pattern.len();
            best = match best {
                Some((best_len, best_allow))
                    if best_len > len || (best_len == len && best_allow) =>
                {
                    Some((best_len, best_allow))
                }
                _ => Some((len, rule.allow)),
            };
        }
        best.map_or(true, |(_, allow)| allow)
    }
}

/// Parsed robots.txt rules.
#[derive(Debug, Clone, Default)]
pub struct RobotsTxt {
    /// Rules per user-agent (lowercase)
    rules: HashMap<String, AgentRules>,

    /// Default rules (for *)
    default_rules: AgentRules,
}

impl RobotsTxt {
    /// Parse robots.txt content.
    pub fn parse(content: &str) -> Self {
        let mut robots = Self::default();
        let mut current_agents: Vec<String> = Vec::new();
        let mut current_rules = AgentRules::default();
        // A User-agent line after a rule line starts a new group
        let mut seen_rule = false;

        for line in content.lines() {
            // Strip trailing comments
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let directive = directive.trim().to_lowercase();
            let value = value.trim();

            match directive.as_str() {
                "user-agent" => {
                    if seen_rule {
                        robots.store_group(&current_agents, &current_rules);
                        current_agents.clear();
                        current_rules = AgentRules::default();
                        seen_rule = false;
                    }
                    current_agents.push(value.to_lowercase());
                }
                "disallow" | "allow" => {
                    seen_rule = true;
                    if !value.is_empty() {
                        current_rules.rules.push(Rule {
                            pattern: value.to_string(),
                            allow: directive == "allow",
                        });
                    }
                }
                // Still a group member, so it closes the agent list
                "crawl-delay" => seen_rule = true,
                _ => {}
            }
        }

        robots.store_group(&current_agents, &current_rules);
        robots
    }

    fn store_group(&mut self, agents: &[String], rules: &AgentRules) {
        for agent in agents {
            if agent == "*" {
                self.default_rules.merge(rules);
            } else {
                self.rules.entry(agent.clone()).or_default().merge(rules);
            }
        }
    }

    /// Rules for a user-agent: the first of its product tokens that names a
    /// group, else `*`. Group names must equal a token; `bot` does not match
    /// `Discordbot`.
    fn rules_for(&self, user_agent: &str) -> &AgentRules {
        product_tokens(user_agent)
            .iter()
            .find_map(|token| self.rules.get(token))
            .unwrap_or(&self.default_rules)
    }

    /// Check if a path is allowed for a user-agent.
    pub fn is_allowed(&self, user_agent: &str, path: &str) -> bool {
        self.rules_for(user_agent).is_allowed(path)
    }
}

/// Lowercased product tokens of a User-Agent, leading product first.
///
/// `Mozilla/5.0 (compatible; Discordbot/2.0)` yields `mozilla`, `discordbot`;
/// a bare `fxfedi` yields `fxfedi`.
fn product_tokens(user_agent: &str) -> Vec<String> {
    let lower = user_agent.to_lowercase();
    let pieces = lower
        .split(|c: char| c.is_whitespace() || matches!(c, ';' | '(' | ')' | ','))
        .filter(|piece| !piece.is_empty());

    let mut tokens: Vec<String> = Vec::new();
    for (i, piece) in pieces.enumerate() {
        let name = match piece.split_once('/') {
            Some((name, _)) => name,
            None if i == 0 => piece,
            None => continue,
        };
        let is_token = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if is_token && !tokens.iter().any(|t| t == name) {
            tokens.push(name.to_string());
        }
    }
    tokens
}

/// Match a robots pattern supporting `*` wildcards and a trailing `$` anchor.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(stripped) => (stripped, true),
        None => (pattern, false),
    };

    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = path.strip_prefix(first) else {
        return false;
    };

    let remaining: Vec<&str> = parts.collect();
    if remaining.is_empty() {
        return !anchored || rest.is_empty();
    }

    for (i, part) in remaining.iter().enumerate() {
        let is_last = i == remaining.len() - 1;
        if is_last && anchored {
            return rest.ends_with(part);
        }
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    true
}

/// Parsed robots rules for one origin.
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    origin: String,
    robots: RobotsTxt,
}

impl RobotsPolicy {
    /// Rules for the origin of `url`.
    pub fn new(url: &Url, robots: RobotsTxt) -> Self {
        Self {
            origin: url.origin().ascii_serialization(),
            robots,
        }
    }

    /// Parse robots.txt content for the origin of `url`.
    pub fn parse(url: &Url, content: &str) -> Self {
        Self::new(url, RobotsTxt::parse(content))
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn robots(&self) -> &RobotsTxt {
        &self.robots
    }

    /// Whether `token` may not fetch `url`. URLs on another origin are never
    /// disallowed by this policy.
    pub fn disallows(&self, url: &Url, token: &str) -> bool {
        if url.origin().ascii_serialization() != self.origin {
            return false;
        }
        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        !self.robots.is_allowed(token, &path)
    }
}

/// Fetch and parse `{origin}/robots.txt` for the origin of `url`.
///
/// Returns `None` on any transport failure or timeout. A non-2xx answer, or
/// an HTML page served in place of robots.txt, yields an empty policy.
pub async fn fetch_policy(
    fetcher: &dyn Fetcher,
    url: &Url,
    timeout: Duration,
) -> Option<RobotsPolicy> {
    let robots_url = url.join("/robots.txt").ok()?;

    match tokio::time::timeout(timeout, fetcher.get(&robots_url)).await {
        Ok(Ok(response)) if response.is_success() && !response.is_html() => {
            debug!(url = %robots_url, "Parsed robots.txt");
            Some(RobotsPolicy::parse(url, &response.body))
        }
        Ok(Ok(response)) => {
            // No robots.txt or error - allow all
            debug!(url = %robots_url, status = response.status, "No usable robots.txt");
            Some(RobotsPolicy::new(url, RobotsTxt::default()))
        }
        Ok(Err(e)) => {
            warn!(url = %robots_url, error = %e, "robots.txt fetch failed, allowing");
            None
        }
        Err(_) => {
            warn!(url = %robots_url, "robots.txt fetch timed out, allowing");
            None
        }
    }
}

/// Whether `token` is blocked from `url`. No policy means no restriction.
pub fn is_disallowed(policy: Option<&RobotsPolicy>, url: &Url, token: &str) -> bool {
    policy.is_some_and(|policy| policy.disallows(url, token))
}

/// Whether any of `tokens` is blocked from `url`.
pub fn is_disallowed_for_any<I, S>(policy: Option<&RobotsPolicy>, url: &Url, tokens: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .any(|token| is_disallowed(policy, url, token.as_ref()))
}
