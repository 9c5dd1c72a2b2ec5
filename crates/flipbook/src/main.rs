use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

use flipbook::{Animator, PlaybackConfig, PlaybackEvent};

const USAGE: &str =
    "usage: flipbook <path> [--seconds S] [--fps F] [--max-frames N] [--seek FRAME]";

#[derive(Debug)]
struct Options {
    path: PathBuf,
    seconds: f32,
    fps: f32,
    max_frames: Option<usize>,
    seek: Option<usize>,
}

fn flag_value<T: FromStr>(flag: &str, value: Option<String>) -> Result<T> {
    let Some(value) = value else {
        bail!("{flag} needs a value\n{USAGE}");
    };
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid value for {flag}: {value}"))
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options> {
    let mut path = None;
    let mut opts = Options {
        path: PathBuf::new(),
        seconds: 5.0,
        fps: 60.0,
        max_frames: None,
        seek: None,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seconds" => opts.seconds = flag_value(&arg, args.next())?,
            "--fps" => opts.fps = flag_value(&arg, args.next())?,
            "--max-frames" => opts.max_frames = Some(flag_value(&arg, args.next())?),
            "--seek" => opts.seek = Some(flag_value(&arg, args.next())?),
            s if s.starts_with("--") => bail!("unknown flag {s}\n{USAGE}"),
            _ if path.is_none() => path = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument {arg}\n{USAGE}"),
        }
    }

    let Some(path) = path else {
        bail!("{USAGE}");
    };
    if opts.fps <= 0.0 || !opts.fps.is_finite() {
        bail!("--fps must be positive");
    }
    opts.path = path;
    Ok(opts)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let opts = parse_args(std::env::args().skip(1))?;

    let mut config = PlaybackConfig::load();
    if let Some(n) = opts.max_frames {
        config.max_frame_count = n;
    }

    let mut animator = Animator::try_open(&opts.path, &config)
        .with_context(|| format!("opening {}", opts.path.display()))?;
    if let Some(frame) = opts.seek {
        animator.seek_to_frame(frame);
    }

    // Simulated display link
    let dt = 1.0 / opts.fps;
    let ticks = (opts.seconds * opts.fps).ceil() as usize;
    let mut frames_shown = 0usize;

    for _ in 0..ticks {
        match animator.tick(dt) {
            PlaybackEvent::None => {}
            PlaybackEvent::FrameChanged => frames_shown += 1,
            PlaybackEvent::LoopCompleted { loops } => {
                frames_shown += 1;
                log::info!("Loop {} complete", loops);
            }
            PlaybackEvent::Finished { loops } => {
                frames_shown += 1;
                log::info!("Finished after {} loop(s)", loops);
                break;
            }
        }
        if animator.take_needs_upload() && animator.current_image().is_none() {
            log::debug!("Frame {} has no image", animator.current_frame());
        }
    }

    let cache = animator.cache();
    log::info!(
        "Played {:.1}s: {} frame changes, {} decodes ({} of {} frames cached), {} loop(s), ending on frame {}",
        opts.seconds,
        frames_shown,
        cache.decode_calls(),
        cache.buffer_len(),
        cache.frame_count(),
        animator.loops_played(),
        animator.current_frame()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_path_and_flags() {
        let opts = parse_args(args(&["a.gif", "--fps", "30", "--max-frames", "4", "--seek", "2"])).unwrap();
        assert_eq!(opts.path, PathBuf::from("a.gif"));
        assert!((opts.fps - 30.0).abs() < 1e-6);
        assert_eq!(opts.max_frames, Some(4));
        assert_eq!(opts.seek, Some(2));
        assert!((opts.seconds - 5.0).abs() < 1e-6);
    }

    #[test]
    fn path_is_required() {
        assert!(parse_args(args(&["--fps", "30"])).is_err());
    }

    #[test]
    fn rejects_unknown_flag_and_bad_values() {
        assert!(parse_args(args(&["a.gif", "--loop"])).is_err());
        assert!(parse_args(args(&["a.gif", "--fps", "fast"])).is_err());
        assert!(parse_args(args(&["a.gif", "--fps", "0"])).is_err());
        assert!(parse_args(args(&["a.gif", "--seconds"])).is_err());
    }
}
