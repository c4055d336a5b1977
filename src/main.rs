use anyhow::Result;
use clap::Parser;
use picker::config::load_config;
use picker::sources::json::load_items;
use picker::sources::list::ListSource;
use picker::state::ComboBox;
use picker::ui::render::TextRenderer;
use std::io::{self, BufRead};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON candidate file; falls back to the config's [[items]]
    #[arg(short, long)]
    items: Option<PathBuf>,

    /// Id of the already selected value
    #[arg(short, long)]
    value: Option<String>,

    /// Section to open in
    #[arg(short, long)]
    section: Option<String>,

    /// Rank once for this query and exit instead of reading commands
    #[arg(short, long)]
    query: Option<String>,

    /// Visible rows
    #[arg(long, default_value_t = 10)]
    rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Type(String),
    Backspace,
    Clear,
    Down,
    Up,
    Home,
    End,
    Section(String),
    Scroll(isize),
    Hover(usize),
    Click(usize),
    Enter,
    CtrlEnter,
    Escape,
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim_start();
    let (word, rest) = line.split_once(' ').unwrap_or((line.trim_end(), ""));
    match word {
        "type" => Some(Command::Type(rest.to_string())),
        "backspace" => Some(Command::Backspace),
        "clear" => Some(Command::Clear),
        "down" => Some(Command::Down),
        "up" => Some(Command::Up),
        "home" => Some(Command::Home),
        "end" => Some(Command::End),
        "section" => Some(Command::Section(rest.trim().to_string())),
        "scroll" => rest.trim().parse().ok().map(Command::Scroll),
        "hover" => rest.trim().parse().ok().map(Command::Hover),
        "click" => rest.trim().parse().ok().map(Command::Click),
        "enter" => Some(Command::Enter),
        "ctrl-enter" => Some(Command::CtrlEnter),
        "escape" => Some(Command::Escape),
        _ => None,
    }
}

fn print_window(combo: &ComboBox<ListSource>, renderer: &mut TextRenderer) {
    renderer.set_query(combo.query());
    combo.render(renderer);
    if let Some(title) = combo.section_title() {
        println!("[{}]", title);
    }
    for line in renderer.lines() {
        println!("{}", line);
    }
    println!();
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // 1. Load config and candidates
    let config = load_config(args.config.as_deref())?;

    let mut source = match &args.items {
        Some(path) => load_items(path)?,
        None => ListSource::from_items(config.items.clone()),
    };
    if source.is_empty() {
        log::warn!("No candidates loaded");
    }
    if let Some(label) = &config.picker.create_item_label {
        source = source.with_create_label(label.as_str());
    }

    // 2. Open a session
    let mut combo = ComboBox::new(source, &config);
    combo.set_current_value(args.value.clone());
    combo.on_selection(|event| {
        println!("value-changed: {}", event.id);
        println!("index-selected: {} new_tab={}", event.index, event.new_tab);
    });
    combo.open_in_section(args.section.clone());

    let mut renderer = TextRenderer::new(args.rows, &config.picker);

    if let Some(query) = &args.query {
        combo.set_query(query);
        print_window(&combo, &mut renderer);
        return Ok(());
    }

    // 3. Drive it from stdin, one command per line
    print_window(&combo, &mut renderer);
    let mut query = String::new();

    for line in io::stdin().lock().lines() {
        let line = line?;
        let Some(command) = parse_command(&line) else {
            log::warn!("Ignoring unknown command '{}'", line);
            continue;
        };

        match command {
            Command::Type(text) => {
                query.push_str(&text);
                combo.set_query(&query);
            }
            Command::Backspace => {
                query.pop();
                combo.set_query(&query);
            }
            Command::Clear => {
                query.clear();
                combo.clear_search();
            }
            Command::Down => {
                combo.move_next();
            }
            Command::Up => {
                combo.move_prev();
            }
            Command::Home => {
                combo.move_first();
            }
            Command::End => {
                combo.move_last();
            }
            Command::Section(id) => combo.set_section((!id.is_empty()).then_some(id.as_str())),
            Command::Scroll(delta) => {
                renderer.scroll_by(delta);
                combo.user_scrolled();
            }
            Command::Hover(index) => {
                combo.hover(index);
            }
            Command::Click(index) => {
                combo.click(index, false);
            }
            Command::Enter => {
                combo.commit_active(false);
            }
            Command::CtrlEnter => {
                combo.commit_active(true);
            }
            Command::Escape => combo.cancel(),
        }

        if !combo.is_open() {
            break;
        }

        print_window(&combo, &mut renderer);
        if let Some((first, last)) = renderer.visible_range() {
            combo.visible_range_changed(first, last);
        }
    }

    combo.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("type kitchen l"), Some(Command::Type("kitchen l".into())));
        assert_eq!(parse_command("down"), Some(Command::Down));
        assert_eq!(parse_command("ctrl-enter\n"), Some(Command::CtrlEnter));
        assert_eq!(parse_command("section rooms"), Some(Command::Section("rooms".into())));
        assert_eq!(parse_command("scroll -3"), Some(Command::Scroll(-3)));
        assert_eq!(parse_command("click 2"), Some(Command::Click(2)));
        assert_eq!(parse_command("click two"), None);
        assert_eq!(parse_command("dance"), None);
    }
}
