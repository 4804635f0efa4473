//! CLI driver for a cortiview dataset.
//!
//! Examples:
//!   cortiview-cli info manifest.json
//!   cortiview-cli sample manifest.json 4400
//!   cortiview-cli seed manifest.json left 120
//!   cortiview-cli seed manifest.json right 120 --palette rainbow
//!
//! `sample` prints per-hemisphere field statistics at continuous time `t`;
//! `seed` runs the whole-brain correlation pass for the given vertex and
//! prints the result. Both map the field through the color table and report
//! the color at the seed/first vertex as a sanity check.

use std::process;

use cortiview::prelude::*;

fn usage() -> ! {
    eprintln!(
        "usage:
  cortiview-cli info <manifest.json>
  cortiview-cli sample <manifest.json> <t>
  cortiview-cli seed <manifest.json> <left|right> <vertex> [--palette <name>]"
    );
    process::exit(1);
}

fn field_stats(field: &[f32]) -> (f32, f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut sum = 0.0f64;
    let mut n = 0usize;
    for &v in field {
        if !v.is_finite() {
            continue;
        }
        min = min.min(v);
        max = max.max(v);
        sum += v as f64;
        n += 1;
    }
    let mean = if n > 0 { (sum / n as f64) as f32 } else { 0.0 };
    (min, max, mean)
}

fn print_fields(session: &Session) {
    let Some((left, right)) = session.active_fields() else {
        println!("no active data");
        return;
    };
    for (name, field) in [("left", left), ("right", right)] {
        let (min, max, mean) = field_stats(field);
        println!(
            "{name}: n={} min={min:.4} max={max:.4} mean={mean:.4}",
            field.len()
        );
    }
    let (left_colors, _) = session.colors();
    let [r, g, b] = left_colors[0];
    println!(
        "color[left 0] = ({r:.3}, {g:.3}, {b:.3})  palette={} domain=[{}, {}]",
        session.lut().palette(),
        session.lut().min_v(),
        session.lut().max_v()
    );
}

fn load_session(manifest_path: &str) -> Result<(Session, Manifest), CoreError> {
    let manifest = Manifest::from_path(manifest_path.as_ref())?;
    let mut session = Session::new(manifest.dims);
    session.load_manifest_blocking(&manifest)?;
    Ok((session, manifest))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    match args[0].as_str() {
        "info" => {
            if args.len() < 2 {
                usage();
            }
            let (session, manifest) = load_session(&args[1])?;
            let dims = session.dims();
            println!(
                "vertices={} row_length={} frame_width={}",
                dims.num_vertices, dims.row_length, dims.frame_width
            );
            if let Some(max_t) = session.max_time() {
                println!("max_time={max_t}");
            }
            if let Some(frames) = manifest.num_frames {
                println!("frames={frames}");
            }
            println!("status: {}", session.status());
        }
        "sample" => {
            if args.len() < 3 {
                usage();
            }
            let t: f64 = args[2].parse().map_err(|_| "t must be a number")?;
            let (mut session, _) = load_session(&args[1])?;
            session.set_mode(Mode::Time);
            if !session.set_time(t)? {
                let max_t = session.max_time().unwrap_or(0.0);
                eprintln!("t={t} is outside the valid domain [0, {max_t})");
                process::exit(1);
            }
            print_fields(&session);
        }
        "seed" => {
            if args.len() < 4 {
                usage();
            }
            let hemisphere = match args[2].as_str() {
                "left" => Hemisphere::Left,
                "right" => Hemisphere::Right,
                _ => usage(),
            };
            let vertex: usize = args[3].parse().map_err(|_| "vertex must be an index")?;

            let (mut session, _) = load_session(&args[1])?;
            session.set_mode(Mode::Seed);

            if let Some(pos) = args.iter().position(|a| a == "--palette") {
                let name = args.get(pos + 1).map(String::as_str).unwrap_or_else(|| usage());
                let palette = Palette::from_name(name)
                    .ok_or_else(|| format!("unknown palette '{name}'"))?;
                session.lut_mut().set_palette(palette);
            }

            match session.pick_seed(vertex, hemisphere) {
                PickOutcome::Started => {}
                other => {
                    eprintln!("seed pick refused: {other:?}");
                    process::exit(1);
                }
            }
            println!("{}", session.status());
            while !session.poll() {
                std::thread::sleep(std::time::Duration::from_millis(10));
            }
            println!("{}", session.status());
            print_fields(&session);
        }
        _ => usage(),
    }
    Ok(())
}
