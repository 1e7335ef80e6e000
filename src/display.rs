use owo_colors::OwoColorize;

pub fn success(msg: &str) {
    println!("{} {msg}", "✓".green().bold());
}
