use std::{
    env, fs,
    io::{self, Read, Write},
    process::ExitCode,
};

use html_api::{html_processor::HtmlProcessor, tag_processor::TagProcessor};

const USAGE: &str = "usage: html-api [--normalize | --breadcrumbs] [FILE]";

enum Mode {
    Count,
    Normalize,
    Breadcrumbs,
}

fn read_input(path: Option<&str>) -> io::Result<Vec<u8>> {
    match path {
        Some(path) => fs::read(path),
        None => {
            let mut html = Vec::new();
            io::stdin().read_to_end(&mut html)?;
            Ok(html)
        }
    }
}

fn count_tokens(html: &[u8]) -> Result<(), String> {
    let mut tag_processor = TagProcessor::new(html);
    let mut tag_processor_tokens = 0u32;
    while tag_processor.next_token() {
        tag_processor_tokens += 1;
    }

    let mut processor =
        HtmlProcessor::create_full_parser(html).ok_or("Cannot create a parser for the input")?;
    let mut html_processor_tokens = 0u32;
    while processor.next_token() {
        if !processor.is_virtual() {
            html_processor_tokens += 1;
        }
    }

    log::info!("Tag processor found {tag_processor_tokens} tokens");
    log::info!("HTML processor found {html_processor_tokens} tokens");

    match processor.get_last_error() {
        Some(error) => Err(error.to_string()),
        None => {
            println!("{tag_processor_tokens} {html_processor_tokens}");
            Ok(())
        }
    }
}

fn print_breadcrumbs(html: &[u8]) -> Result<(), String> {
    let mut processor =
        HtmlProcessor::create_full_parser(html).ok_or("Cannot create a parser for the input")?;
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    while processor.next_tag(None) {
        let path = processor
            .get_breadcrumbs()
            .iter()
            .map(|node_name| node_name.to_string())
            .collect::<Vec<_>>()
            .join(" > ");
        writeln!(writer, "{path}").map_err(|error| error.to_string())?;
    }

    match processor.get_last_error() {
        Some(error) => Err(error.to_string()),
        None => Ok(()),
    }
}

fn normalize(html: &[u8]) -> Result<(), String> {
    let normalized = HtmlProcessor::normalize(html).map_err(|error| error.to_string())?;
    log::debug!("Normalized {} bytes into {}", html.len(), normalized.len());
    println!("{normalized}");
    Ok(())
}

pub fn main() -> ExitCode {
    env_logger::init();

    let mut mode = Mode::Count;
    let mut path = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--normalize" => mode = Mode::Normalize,
            "--breadcrumbs" => mode = Mode::Breadcrumbs,
            "-h" | "--help" => {
                println!("{USAGE}");
                return ExitCode::SUCCESS;
            }
            _ if arg.starts_with('-') || path.is_some() => {
                eprintln!("{USAGE}");
                return ExitCode::FAILURE;
            }
            _ => path = Some(arg),
        }
    }

    let html = match read_input(path.as_deref()) {
        Ok(html) => html,
        Err(error) => {
            log::error!("Cannot read input: {error}");
            return ExitCode::FAILURE;
        }
    };

    let result = match mode {
        Mode::Count => count_tokens(&html),
        Mode::Normalize => normalize(&html),
        Mode::Breadcrumbs => print_breadcrumbs(&html),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{error}");
            ExitCode::FAILURE
        }
    }
}
