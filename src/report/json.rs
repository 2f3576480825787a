//! JSON output for prepared dashboards.
//!
//! The shape is what a plotting front end consumes directly.

use super::Dashboard;

pub fn render(dashboard: &Dashboard) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::prepare;

    #[test]
    fn unresolved_coordinates_are_null() {
        let records = serde_json::from_str::<Vec<_>>(
            r#"[{"provinceName":"湖北省","confirmedCount":3,"cities":[{"cityName":"武汉","confirmedCount":3}]}]"#,
        )
        .unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&render(&prepare("k", &records)).unwrap()).unwrap();

        let city = &value["cities"][0]["cities"][0];
        assert_eq!(city["city"], "武汉");
        assert_eq!(city["confirmed"], 3);
        assert!(city["coordinates"].is_null());
        assert_eq!(value["country"], "全国");
    }
}
