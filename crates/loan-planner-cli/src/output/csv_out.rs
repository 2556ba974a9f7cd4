use serde_json::{Map, Value};
use std::io;

/// Result fields written as a row table when present, in priority order.
const ROW_FIELDS: [&str; 3] = ["rows", "compared", "loans"];

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let body = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match body {
        Value::Object(map) => match row_field(map) {
            Some(rows) => write_array_csv(&mut wtr, rows),
            None => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(body)]);
        }
    }

    let _ = wtr.flush();
}

fn row_field(map: &Map<String, Value>) -> Option<&[Value]> {
    ROW_FIELDS.iter().find_map(|f| match map.get(*f) {
        Some(Value::Array(arr)) => Some(arr.as_slice()),
        _ => None,
    })
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schedule_rows_preferred() {
        let result = json!({"rows": [{"period": 1}], "loans": [{"id": "a"}]});
        let rows = row_field(result.as_object().unwrap()).unwrap();
        assert_eq!(rows[0]["period"], 1);
    }

    #[test]
    fn test_rows_written_with_headers() {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_array_csv(
            &mut wtr,
            &[json!({"payment": "10", "period": 1}), json!({"payment": "9", "period": 2})],
        );
        let out = String::from_utf8(wtr.into_inner().map_err(|_| "flush failed").unwrap()).unwrap();
        assert_eq!(out, "payment,period\n10,1\n9,2\n");
    }
}
