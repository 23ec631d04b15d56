//! Rule compilation and evaluation
//!
//! Rule text is parsed once into matchers; evaluation afterwards is pure and
//! never fails. A malformed source address can only be denied.

use crate::config::schema::{Config, RuleConfig, ScheduleConfig};
use crate::defines::DefineProvider;
use crate::error::{PolicyError, Result};
use chrono::{Datelike, Local, NaiveDateTime};
use indexmap::IndexMap;
use rulegate_match::{
    name_to_index, parse_simple_24h, validate, Alignment, DayWindow, IpAddressList, TimeWindow,
    ValidateError,
};

/// Used when `rules.max_ip_entries` is not defined
pub const DEFAULT_MAX_IP_ENTRIES: i64 = 256;
const MAX_IP_ENTRIES_LIMIT: i64 = 65_535;

/// A compiled periodic schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    interval: i64,
    scan_time: Option<TimeWindow>,
    scan_day: Option<u8>,
}

impl Schedule {
    /// Compile a schedule
    ///
    /// A scan day requires the interval to be whole weeks, a scan time whole
    /// days.
    pub fn from_config(config: &ScheduleConfig) -> std::result::Result<Self, ValidateError> {
        let scan_time = config
            .scan_time
            .as_deref()
            .map(|text| parse_simple_24h(text).and_then(|hhmm| TimeWindow::parse_unique(&hhmm)))
            .transpose()?;

        let scan_day = config.scan_day.as_deref().map(name_to_index).transpose()?;

        let mut schedule = Self {
            interval: 0,
            scan_time,
            scan_day,
        };
        schedule.interval = validate(config.interval, schedule.alignment())?;

        Ok(schedule)
    }

    pub fn alignment(&self) -> Alignment {
        if self.scan_day.is_some() {
            Alignment::Week
        } else if self.scan_time.is_some() {
            Alignment::Day
        } else {
            Alignment::None
        }
    }

    /// Interval in seconds
    pub fn interval(&self) -> i64 {
        self.interval
    }

    pub fn scan_time(&self) -> Option<&TimeWindow> {
        self.scan_time.as_ref()
    }

    /// Weekday index, 0 (Sunday) to 6 (Saturday)
    pub fn scan_day(&self) -> Option<u8> {
        self.scan_day
    }

    /// True once the scan day (if any) is today and the scan time (if any)
    /// has been reached
    pub fn is_due(&self, at: NaiveDateTime) -> bool {
        let day_ok = self
            .scan_day
            .map_or(true, |day| at.weekday().num_days_from_sunday() == u32::from(day));
        let time_ok = self
            .scan_time
            .map_or(true, |time| time.is_after_time(at.time()));

        day_ok && time_ok
    }
}

/// A compiled rule
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    description: String,
    allow: IpAddressList,
    deny: IpAddressList,
    time: Option<TimeWindow>,
    days: Option<DayWindow>,
    schedule: Option<Schedule>,
}

impl Rule {
    /// Compile the named rule from a configuration
    pub fn from_config(name: &str, config: &Config) -> Result<Self> {
        let rule = config.rules.get(name).ok_or_else(|| PolicyError::RuleNotFound {
            rule: name.to_string(),
        })?;

        Self::compile(name, rule, max_ip_entries(&config.defines)?)
    }

    fn compile(name: &str, rule: &RuleConfig, max_entries: i64) -> Result<Self> {
        let invalid = |source: ValidateError| PolicyError::InvalidRule {
            rule: name.to_string(),
            source,
        };

        for list in [&rule.allow_ips, &rule.deny_ips] {
            if list.len() as i64 > max_entries {
                return Err(PolicyError::TooManyEntries {
                    rule: name.to_string(),
                    count: list.len(),
                    limit: max_entries,
                });
            }
        }

        // An empty allow list still rejects malformed addresses
        let allow = if rule.allow_ips.is_empty() {
            IpAddressList::parse_all(["any"]).map_err(invalid)?
        } else {
            IpAddressList::parse_all(&rule.allow_ips).map_err(invalid)?
        };
        let deny = IpAddressList::parse_all(&rule.deny_ips).map_err(invalid)?;

        let time = rule
            .time
            .as_deref()
            .map(TimeWindow::parse)
            .transpose()
            .map_err(invalid)?;
        let days = rule
            .days
            .as_deref()
            .map(DayWindow::parse)
            .transpose()
            .map_err(invalid)?;
        let schedule = rule
            .schedule
            .as_ref()
            .map(Schedule::from_config)
            .transpose()
            .map_err(invalid)?;

        tracing::debug!(
            "Compiled rule {}: {} allow, {} deny, time {:?}, days {:?}",
            name,
            allow.len(),
            deny.len(),
            time.map(|t| t.to_string()),
            days.map(|d| d.to_string())
        );

        Ok(Self {
            name: name.to_string(),
            description: rule.description.clone(),
            allow,
            deny,
            time,
            days,
            schedule,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn time(&self) -> Option<&TimeWindow> {
        self.time.as_ref()
    }

    pub fn days(&self) -> Option<&DayWindow> {
        self.days.as_ref()
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    /// Check the time and day windows
    pub fn in_window(&self, at: NaiveDateTime) -> bool {
        let time_ok = self.time.map_or(true, |window| window.contains_time(at.time()));
        let day_ok = self
            .days
            .map_or(true, |days| days.contains_weekday(at.weekday()));

        time_ok && day_ok
    }

    /// Check whether `ip` may pass this rule at `at`
    ///
    /// Outside the rule's windows nothing passes. Inside, a matching deny
    /// entry wins over any allow entry.
    pub fn permits(&self, ip: &str, at: NaiveDateTime) -> bool {
        if !self.in_window(at) {
            tracing::trace!("Rule {}: {} outside window at {}", self.name, ip, at);
            return false;
        }

        if self.deny.matches_any(ip) {
            tracing::trace!("Rule {}: {} denied", self.name, ip);
            return false;
        }

        self.allow.matches_any(ip)
    }

    /// [`Rule::permits`] at the current local time
    pub fn permits_now(&self, ip: &str) -> bool {
        self.permits(ip, Local::now().naive_local())
    }
}

/// All rules of a configuration, compiled
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: IndexMap<String, Rule>,
}

impl RuleSet {
    /// Compile every rule, failing on the first invalid one
    pub fn from_config(config: &Config) -> Result<Self> {
        let max_entries = max_ip_entries(&config.defines)?;

        let rules = config
            .rules
            .iter()
            .map(|(name, rule)| Ok((name.clone(), Rule::compile(name, rule, max_entries)?)))
            .collect::<Result<IndexMap<_, _>>>()?;

        Ok(Self { rules })
    }

    /// Get a compiled rule by name
    pub fn rule(&self, name: &str) -> Result<&Rule> {
        self.rules.get(name).ok_or_else(|| PolicyError::RuleNotFound {
            rule: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }
}

fn max_ip_entries(defines: &impl DefineProvider) -> Result<i64> {
    defines.get_define_int_or(
        "rules",
        "max_ip_entries",
        1,
        MAX_IP_ENTRIES_LIMIT,
        DEFAULT_MAX_IP_ENTRIES,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use chrono::NaiveDate;

    // 2024-01-01 is a Monday
    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn create_test_config() -> Config {
        ConfigLoader::load_from_str(
            r#"
[rules.office]
description = "Office hours access"
allow_ips = ["10.0.0.0/24", "192.168.1.7"]
deny_ips = ["10.0.0.13"]
time = "8:00 am - 6:00 pm"
days = "weekdays"

[rules.night]
time = "22:00-06:00"

[rules.weekly]
allow_ips = ["172.16.0.0/255.240.0.0"]

[rules.weekly.schedule]
interval = 604800
scan_day = "sun"
scan_time = "02:30"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_rule_from_config() {
        let config = create_test_config();
        let rule = Rule::from_config("office", &config).unwrap();

        assert_eq!(rule.name(), "office");
        assert_eq!(rule.description(), "Office hours access");
        assert_eq!(rule.time().unwrap().to_string(), "08:00-18:00");
        assert_eq!(
            rule.days().unwrap().to_string(),
            "monday,tuesday,wednesday,thursday,friday"
        );
        assert!(rule.schedule().is_none());
    }

    #[test]
    fn test_rule_not_found() {
        let config = create_test_config();
        let result = Rule::from_config("nonexistent", &config);

        assert!(matches!(result, Err(PolicyError::RuleNotFound { .. })));
    }

    #[test]
    fn test_permits_allow_and_deny() {
        let config = create_test_config();
        let rule = Rule::from_config("office", &config).unwrap();
        let monday_noon = at(1, 12, 0);

        assert!(rule.permits("10.0.0.5", monday_noon));
        assert!(rule.permits("192.168.1.7", monday_noon));
        assert!(!rule.permits("10.0.0.13", monday_noon));
        assert!(!rule.permits("10.0.1.5", monday_noon));
        assert!(!rule.permits("garbage", monday_noon));
    }

    #[test]
    fn test_permits_respects_windows() {
        let config = create_test_config();
        let rule = Rule::from_config("office", &config).unwrap();

        // Monday evening
        assert!(!rule.permits("10.0.0.5", at(1, 19, 0)));
        // Saturday noon
        assert!(!rule.permits("10.0.0.5", at(6, 12, 0)));
        // Friday at closing time
        assert!(rule.permits("10.0.0.5", at(5, 18, 0)));
    }

    #[test]
    fn test_empty_allow_list_allows_well_formed_addresses() {
        let config = create_test_config();
        let rule = Rule::from_config("night", &config).unwrap();

        assert!(rule.permits("8.8.8.8", at(3, 23, 30)));
        assert!(rule.permits("8.8.8.8", at(3, 1, 0)));
        assert!(!rule.permits("8.8.8.8", at(3, 12, 0)));
        assert!(!rule.permits("not-an-ip", at(3, 23, 30)));
    }

    #[test]
    fn test_schedule() {
        let config = create_test_config();
        let rule = Rule::from_config("weekly", &config).unwrap();
        let schedule = rule.schedule().unwrap();

        assert_eq!(schedule.alignment(), Alignment::Week);
        assert_eq!(schedule.interval(), 604800);
        assert_eq!(schedule.scan_day(), Some(0));
        assert_eq!(schedule.scan_time().unwrap().to_string(), "02:30");

        // Sunday 2024-01-07
        assert!(!schedule.is_due(at(7, 2, 0)));
        assert!(schedule.is_due(at(7, 2, 30)));
        assert!(!schedule.is_due(at(8, 3, 0)));
    }

    #[test]
    fn test_schedule_alignment_enforced() {
        let daily = ScheduleConfig {
            interval: 90_000,
            scan_time: Some("02:30".to_string()),
            scan_day: None,
        };
        assert!(matches!(
            Schedule::from_config(&daily),
            Err(ValidateError::NotAligned { unit: "day", .. })
        ));

        let free = ScheduleConfig {
            interval: 90_000,
            scan_time: None,
            scan_day: None,
        };
        let schedule = Schedule::from_config(&free).unwrap();
        assert_eq!(schedule.alignment(), Alignment::None);
        assert!(schedule.is_due(at(2, 0, 0)));

        let bad_time = ScheduleConfig {
            interval: 86_400,
            scan_time: Some("2:30 pm".to_string()),
            scan_day: None,
        };
        assert!(Schedule::from_config(&bad_time).is_err());

        let bad_day = ScheduleConfig {
            interval: 604_800,
            scan_time: None,
            scan_day: Some("funday".to_string()),
        };
        assert!(matches!(
            Schedule::from_config(&bad_day),
            Err(ValidateError::NotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_rule_names_rule() {
        let mut config = create_test_config();
        config.rules.insert(
            "broken".to_string(),
            RuleConfig {
                allow_ips: vec!["10.0.0.1/33".to_string()],
                ..Default::default()
            },
        );

        match RuleSet::from_config(&config) {
            Err(PolicyError::InvalidRule { rule, source }) => {
                assert_eq!(rule, "broken");
                assert!(matches!(source, ValidateError::InvalidFormat { .. }));
            }
            other => panic!("expected InvalidRule, got {:?}", other),
        }
    }

    #[test]
    fn test_max_ip_entries_define() {
        let mut config = create_test_config();
        config.defines.set("rules", "max_ip_entries", 1);

        let result = Rule::from_config("office", &config);
        assert!(matches!(
            result,
            Err(PolicyError::TooManyEntries { count: 2, limit: 1, .. })
        ));

        config.defines.set("rules", "max_ip_entries", 0);
        assert!(matches!(
            RuleSet::from_config(&config),
            Err(PolicyError::InvalidDefine { .. })
        ));
    }

    #[test]
    fn test_rule_set() {
        let config = create_test_config();
        let rules = RuleSet::from_config(&config).unwrap();

        assert_eq!(rules.len(), 3);
        let names: Vec<&str> = rules.iter().map(|r| r.name()).collect();
        assert_eq!(names, ["office", "night", "weekly"]);

        assert!(rules.rule("weekly").unwrap().permits("172.20.1.1", at(2, 9, 0)));
        assert!(matches!(
            rules.rule("missing"),
            Err(PolicyError::RuleNotFound { .. })
        ));
    }
}
