use rseme::playready::parse_key_message;

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .expect("Usage: playready_inspect <key_message.bin>");

    let message = std::fs::read(path)?;
    let parsed = parse_key_message(&message);
    if parsed.headers.is_empty() {
        println!("headers: <none>");
    } else {
        for (name, value) in parsed.headers.iter() {
            println!("header: {}: {}", name, value);
        }
    }
    println!("challenge_len: {}", parsed.challenge.len());

    Ok(())
}
