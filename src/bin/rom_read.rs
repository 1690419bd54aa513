use rom_grid::config::{load_config, GroupLayout, RunConfig};
use rom_grid::diagnostics::ReadReport;
use rom_grid::image::io::{save_gray_png, save_rgb_png, write_json_file};
use rom_grid::{ImgXY, RasterBuffers, Session, StatusReport};
use serde::Serialize;
use std::env;
use std::path::Path;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let mut session = open_session(&config)?;
    replay_clicks(&mut session, &config)?;

    let read = if config.read {
        Some(session.read_data().map_err(|e| e.to_string())?)
    } else {
        None
    };

    println!("{}", session.status());

    if config.output.hex_dump && session.data_read() {
        let rows = session.data_rows().map_err(|e| e.to_string())?;
        println!();
        for (row, line) in rows.iter().enumerate() {
            println!("{row:4}: {line}");
        }
    }

    if let Some(path) = &config.output.target_png {
        save_rgb_png(session.raster().target(), path).map_err(|e| e.to_string())?;
        println!("Saved preprocessed raster to {}", path.display());
    }
    if let Some(path) = &config.output.peephole_png {
        save_gray_png(&session.peephole_mask(), path).map_err(|e| e.to_string())?;
        println!("Saved aperture mask to {}", path.display());
    }

    if config.output.save {
        let saved = session.save().map_err(|e| e.to_string())?;
        println!("Saved slot {} to {}", saved.slot, saved.grid.display());
        if let Some(txt) = &saved.txt {
            println!("  text: {}", txt.display());
        }
        for dat in &saved.dat {
            println!("  data: {}", dat.display());
        }
    }

    if let Some(path) = &config.output.report_json {
        let summary = RunSummary {
            status: session.status(),
            read,
        };
        write_json_file(path, &summary).map_err(|e| e.to_string())?;
        println!("JSON report written to {}", path.display());
    }

    Ok(())
}

fn layout(config: &RunConfig) -> Result<Option<GroupLayout>, String> {
    match (config.group_cols, config.group_rows) {
        (Some(cols), Some(rows)) => GroupLayout::new(cols, rows)
            .map(Some)
            .map_err(|e| e.to_string()),
        (None, None) => Ok(None),
        _ => Err("group_cols and group_rows must be given together".to_string()),
    }
}

fn open_session(config: &RunConfig) -> Result<Session, String> {
    let layout = layout(config)?;
    let mut session = match &config.grid_file {
        Some(grid) => Session::open(grid, config.input.as_deref(), layout),
        None => {
            let input = config
                .input
                .as_ref()
                .ok_or("config needs an input image or a grid_file")?;
            let layout = layout.ok_or("a new grid needs group_cols and group_rows")?;
            RasterBuffers::load(input).and_then(|raster| {
                Session::new(raster, layout, config.decode.clone().unwrap_or_default())
            })
        }
    }
    .map_err(|e| e.to_string())?;

    if config.grid_file.is_some() {
        if let Some(decode) = &config.decode {
            session
                .set_config(decode.clone())
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(session)
}

fn replay_clicks(session: &mut Session, config: &RunConfig) -> Result<(), String> {
    let autocenter = !config.clicks.exact;
    let columns = config.clicks.column_clicks().map(|c| (true, c));
    let rows = config.clicks.row_clicks().map(|c| (false, c));
    for (is_column, click) in columns.chain(rows) {
        let outcome = if is_column {
            session.add_column_line(click, autocenter)
        } else {
            session.add_row_line(click, autocenter)
        };
        match outcome {
            Ok(outcome) => log::debug!("click {click}: {outcome:?}"),
            Err(err) if err.is_recoverable() => report_skipped(click, &err.to_string()),
            Err(err) => return Err(err.to_string()),
        }
    }
    Ok(())
}

fn report_skipped(click: ImgXY, reason: &str) {
    log::warn!("click {click} ignored: {reason}");
}

fn usage() -> String {
    "Usage: rom_read <config.json>".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    status: StatusReport,
    read: Option<ReadReport>,
}
