//! Analyze an Arabic text from the command line.
//!
//! ```bash
//! GEMINI_API_KEY=... cargo run -p mahir-gemini --example analyze_text -- "العلم نور"
//! ```

use mahir_gemini::Gemini;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let api_key = std::env::var("GEMINI_API_KEY")
        .map_err(|_| anyhow::anyhow!("set GEMINI_API_KEY to a Gemini API key"))?;
    let text = std::env::args().nth(1).unwrap_or_else(|| "العلم نور".to_string());

    let client = Gemini::new(api_key);
    let analysis = client.analyze_text(&text).await?;

    println!("{}", analysis.vocalized_text);
    println!("{}\n", analysis.translation);
    for item in &analysis.grammatical_analysis {
        println!("{:<12} {} ({})", item.word, item.i_rab, item.i_rab_translation);
    }
    Ok(())
}
