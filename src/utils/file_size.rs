pub struct FileSizeUtils;

impl FileSizeUtils {
    /// `B` below 1 KiB, otherwise KB / MB with one decimal.
    pub fn format_size(size: Option<u64>) -> String {
        const UNITS: [&str; 3] = ["B", "KB", "MB"];
        let size = match size {
            Some(size) if size > 0 => size,
            _ => return "Unknown".to_string(),
        };

        let mut value = size as f64;
        let mut unit_index = 0;

        while value >= 1024.0 && unit_index < UNITS.len() - 1 {
            value /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size, UNITS[unit_index])
        } else {
            format!("{:.1} {}", value, UNITS[unit_index])
        }
    }
}
