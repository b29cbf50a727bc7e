//! Utility to explore XLSX row output for development
//!
//! Usage: explore_xlsx <file.xlsx> [sheet] [max rows]
use unxlsx::XlsxReader;

fn main() {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .unwrap_or("test-files/file_example_XLSX_5000.xlsx".to_string());
    let sheet = args.next();
    let limit: usize = args.next().and_then(|n| n.parse().ok()).unwrap_or(20);

    let reader = XlsxReader::open(&path).expect("Failed to open file");

    println!("=== Sheets ===");
    for name in reader.sheet_names() {
        println!(
            "  {} -> {}",
            name,
            reader.sheet_member(name).unwrap_or("<missing>")
        );
    }
    println!(
        "\n{} shared strings, {} date styles",
        reader.shared_strings().len(),
        reader.date_styles().len()
    );

    let Some(sheet) = sheet.or_else(|| reader.sheet_names().first().cloned()) else {
        println!("\nWorkbook has no sheets");
        return;
    };

    println!("\n=== {} (first {} rows) ===", sheet, limit);
    for row in reader.read_rows(&sheet).take(limit) {
        if let Some(err) = &row.error {
            println!("error at row {}: {}", row.index, err);
            break;
        }
        println!(
            "{}",
            serde_json::to_string(&row).expect("Failed to serialize row")
        );
    }
}
