//! Open/closed check for a store against the current Tokyo time

use super::lookup::StoreInfoTool;
use crate::config::ConciergeConfig;
use crate::error::ToolError;
use crate::tools::{Tool, ToolExample};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::{Asia::Tokyo, Tz};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::OnceLock;
use tracing::debug;

const WEEKDAY_NAMES: [&str; 7] = ["月", "火", "水", "木", "金", "土", "日"];
const MINUTES_PER_DAY: u32 = 24 * 60;

static HOURS_PATTERN: OnceLock<Regex> = OnceLock::new();

fn hours_pattern() -> &'static Regex {
    HOURS_PATTERN.get_or_init(|| {
        Regex::new(r"(\d{1,2}):(\d{2})-(\d{1,2}):(\d{2})").expect("hours pattern is a valid regex")
    })
}

/// Whether a free-text `opening_hours` value covers `now`, with a status line.
///
/// Only the first `HH:MM-HH:MM` range is considered. A closing time at or
/// before the opening time runs past midnight.
pub fn business_status(opening_hours: &str, now: &DateTime<Tz>) -> (bool, String) {
    let hours = opening_hours.trim();
    if hours.is_empty() || hours == "情報なし" {
        return (false, "営業時間情報が利用できません".to_string());
    }

    if hours.contains("24時間") || hours.to_lowercase().contains("24hour") {
        return (true, "24時間営業中".to_string());
    }

    let day = WEEKDAY_NAMES[now.weekday().num_days_from_monday() as usize];
    if hours.contains(&format!("{}曜", day)) && hours.contains('休') {
        return (false, format!("{}曜日は定休日", day));
    }

    let Some(caps) = hours_pattern().captures(hours) else {
        return (false, format!("営業時間: {} (判定不可)", hours));
    };
    let field = |i: usize| caps[i].parse::<u32>().unwrap_or_default();
    let (start_h, start_m, end_h, end_m) = (field(1), field(2), field(3), field(4));

    let start = start_h * 60 + start_m;
    let mut end = end_h * 60 + end_m;
    let mut current = now.hour() * 60 + now.minute();
    if end <= start {
        end += MINUTES_PER_DAY;
        if current < start {
            current += MINUTES_PER_DAY;
        }
    }

    let range = format!("{:02}:{:02}-{:02}:{:02}", start_h, start_m, end_h, end_m);
    if (start..=end).contains(&current) {
        (true, format!("営業中（{}）", range))
    } else {
        (false, format!("営業時間外（営業時間: {}）", range))
    }
}

/// Reason for a closure listed for `now`'s date, if any.
///
/// `irregular_closures` is expected to be a JSON list of
/// `{"date": "YYYY-MM-DD", "reason": ...}`; anything else is ignored.
pub fn closure_today(irregular_closures: &str, now: &DateTime<Tz>) -> Option<String> {
    let today = now.format("%Y-%m-%d").to_string();
    let closures: Vec<Value> = serde_json::from_str(irregular_closures).ok()?;

    closures.iter().find_map(|closure| {
        let closure = closure.as_object()?;
        (closure.get("date")?.as_str()? == today).then(|| {
            closure
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or("不明")
                .to_string()
        })
    })
}

fn text_field(row: &Map<String, Value>, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Opening status of a store record at `now`
pub fn check_hours(row: &Map<String, Value>, now: &DateTime<Tz>) -> Value {
    let opening_hours = text_field(row, "opening_hours");
    let irregular_closures = text_field(row, "irregular_closures");

    let (is_open, status) = match closure_today(&irregular_closures, now) {
        Some(reason) => (false, format!("本日は臨時休業です（理由: {}）", reason)),
        None => business_status(&opening_hours, now),
    };

    json!({
        "store_name": text_field(row, "store_name"),
        "store_id": text_field(row, "store_id"),
        "is_open": is_open,
        "status": status,
        "opening_hours": opening_hours,
        "irregular_closures": irregular_closures,
        "current_time": now.format("%Y年%m月%d日 %H:%M").to_string(),
        "check_time": now.to_rfc3339(),
    })
}

/// `check_store_hours`: whether a store is open right now
pub struct StoreHoursTool {
    stores: StoreInfoTool,
}

impl StoreHoursTool {
    pub fn new(config: &ConciergeConfig) -> Self {
        Self {
            stores: StoreInfoTool::new(config),
        }
    }
}

#[async_trait]
impl Tool for StoreHoursTool {
    fn name(&self) -> &str {
        "check_store_hours"
    }

    fn description(&self) -> &str {
        "check_store_hours: Check whether a store is open right now, by store name (partial match) or store id. \
         Uses store_name, opening_hours and irregular_closures and compares them with the current Tokyo time. \
         Returns the open status, opening hours and irregular closures. The store id is for internal use only \
         and must not be shown to the user."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "store_name": {
                    "type": "string",
                    "description": "Store name or part of it",
                    "default": ""
                },
                "store_id": {
                    "type": "string",
                    "description": "Store id such as STR-0001 (internal use only)",
                    "default": ""
                }
            }
        })
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let record = self.stores.execute(args).await?;
        let Value::Object(row) = record else {
            return Err(ToolError::ExecutionFailed {
                name: self.name().to_string(),
                message: "Store record has an unexpected shape".to_string(),
            });
        };

        let now = Utc::now().with_timezone(&Tokyo);
        debug!("Checking hours of '{}' at {}", text_field(&row, "store_name"), now);
        Ok(check_hours(&row, &now))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Is a bakery open now".to_string(),
            parameters: json!({ "store_name": "Bakery" }),
            expected_result: "is_open with today's opening hours".to_string(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    /// 2025-10-06 is a Monday
    fn monday_at(hour: u32, minute: u32) -> DateTime<Tz> {
        Tokyo.with_ymd_and_hms(2025, 10, 6, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_within_regular_hours() {
        assert_eq!(
            business_status("10:00-22:00", &monday_at(12, 0)),
            (true, "営業中（10:00-22:00）".to_string())
        );
        assert_eq!(
            business_status("10:00-22:00", &monday_at(22, 30)),
            (false, "営業時間外（営業時間: 10:00-22:00）".to_string())
        );
        assert!(business_status("9:30-18:00", &monday_at(9, 30)).0);
    }

    #[test]
    fn test_range_past_midnight() {
        assert!(business_status("18:00-2:00", &monday_at(1, 0)).0);
        assert!(business_status("18:00-2:00", &monday_at(23, 0)).0);
        assert!(!business_status("18:00-2:00", &monday_at(3, 0)).0);
    }

    #[test]
    fn test_special_hours() {
        assert_eq!(
            business_status("月曜定休 10:00-20:00", &monday_at(12, 0)),
            (false, "月曜日は定休日".to_string())
        );
        assert!(business_status("火曜定休 10:00-20:00", &monday_at(12, 0)).0);
        assert!(business_status("24時間営業", &monday_at(4, 0)).0);
        assert!(!business_status("情報なし", &monday_at(12, 0)).0);
        assert!(!business_status("", &monday_at(12, 0)).0);
        assert_eq!(
            business_status("Varies by season", &monday_at(12, 0)),
            (false, "営業時間: Varies by season (判定不可)".to_string())
        );
    }

    #[test]
    fn test_irregular_closure_overrides_hours() {
        let mut row = Map::new();
        row.insert("store_name".to_string(), json!("Hills Bakery"));
        row.insert("opening_hours".to_string(), json!("10:00-22:00"));
        row.insert(
            "irregular_closures".to_string(),
            json!(r#"[{"date": "2025-10-06", "reason": "棚卸し"}]"#),
        );

        let status = check_hours(&row, &monday_at(12, 0));
        assert_eq!(status["is_open"], false);
        assert_eq!(status["status"], "本日は臨時休業です（理由: 棚卸し）");
        assert_eq!(status["current_time"], "2025年10月06日 12:00");

        let next_day = Tokyo.with_ymd_and_hms(2025, 10, 7, 12, 0, 0).unwrap();
        assert_eq!(check_hours(&row, &next_day)["is_open"], true);
        assert_eq!(closure_today("not json", &next_day), None);
    }

    #[tokio::test]
    async fn test_execute_reads_store_csv() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("filtered_store_data.csv"),
            "store_id,store_name,opening_hours,irregular_closures\n\
             STR-0001,Hills Bakery,24時間営業,\n",
        )
        .unwrap();
        let config = ConciergeConfig::default().with_data_dir(dir.path());
        let tool = StoreHoursTool::new(&config);

        let mut args = Map::new();
        args.insert("store_name".to_string(), json!("bakery"));
        let status = tool.execute(args).await.unwrap();
        assert_eq!(status["store_id"], "STR-0001");
        assert_eq!(status["is_open"], true);

        let mut args = Map::new();
        args.insert("store_name".to_string(), json!("florist"));
        let err = tool.execute(args).await.unwrap_err();
        assert!(err.to_string().contains("florist"));
    }
}
