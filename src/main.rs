use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stream_compaction::{
    cpu, efficient, naive, CompactionError, Device, DeviceConfig, PerformanceTimer,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Power-of-two input size
const SIZE: usize = 1 << 16;
/// Non-power-of-two input size
const NPOT: usize = SIZE - 3;
/// Elements are drawn from `0..MAX_VALUE`
const MAX_VALUE: i32 = 50;

fn main() -> Result<(), CompactionError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .init();

    let config = DeviceConfig::from_env();
    println!("Stream compaction v{}", stream_compaction::VERSION);
    println!("  Block size: {}", config.block_size);
    println!("  Threads: {}", config.n_threads);
    println!("  Memory limit: {} bytes", config.memory_limit_bytes);

    let device = Device::new(config)?;
    let mut rng = StdRng::seed_from_u64(0x5eed);

    let mut input = generate(&mut rng, SIZE);
    input[SIZE - 1] = 0;
    print_array("input", &input);

    run_scans(&device, &input)?;

    // Compaction inputs keep some zeros and end on a nonzero element.
    let mut input = generate(&mut rng, SIZE);
    input[SIZE - 1] = 1;
    print_array("input", &input);

    run_compactions(&device, &input)?;
    Ok(())
}

fn run_scans(device: &Device, input: &[i32]) -> Result<(), CompactionError> {
    let mut timer = PerformanceTimer::new();
    let mut expected = vec![0; SIZE];
    let mut expected_npot = vec![0; SIZE];
    let mut output = vec![0; SIZE];

    header("cpu scan, power-of-two");
    cpu::scan(SIZE, &mut expected, input, Some(&mut timer));
    report(&timer, None);

    header("cpu scan, non-power-of-two");
    cpu::scan(NPOT, &mut expected_npot, input, Some(&mut timer));
    report(&timer, None);

    header("naive scan, power-of-two");
    naive::scan(device, SIZE, &mut output, input, Some(&mut timer))?;
    report(&timer, Some(output == expected));

    header("naive scan, non-power-of-two");
    output.fill(0);
    naive::scan(device, NPOT, &mut output, input, Some(&mut timer))?;
    report(&timer, Some(output[..NPOT] == expected_npot[..NPOT]));

    header("work-efficient scan, power-of-two");
    efficient::scan(device, SIZE, &mut output, input, Some(&mut timer))?;
    report(&timer, Some(output == expected));

    header("work-efficient scan, non-power-of-two");
    output.fill(0);
    efficient::scan(device, NPOT, &mut output, input, Some(&mut timer))?;
    report(&timer, Some(output[..NPOT] == expected_npot[..NPOT]));

    Ok(())
}

fn run_compactions(device: &Device, input: &[i32]) -> Result<(), CompactionError> {
    let mut timer = PerformanceTimer::new();
    let mut expected = vec![0; SIZE];
    let mut expected_npot = vec![0; SIZE];
    let mut output = vec![0; SIZE];

    header("cpu compact without scan, power-of-two");
    let count = timer.time(|| cpu::compact_without_scan(SIZE, &mut expected, input));
    report(&timer, None);
    println!("    kept {count} of {SIZE}");

    header("cpu compact without scan, non-power-of-two");
    let count_npot = timer.time(|| cpu::compact_without_scan(NPOT, &mut expected_npot, input));
    report(&timer, None);
    println!("    kept {count_npot} of {NPOT}");

    header("cpu compact with scan");
    let kept = timer.time(|| cpu::compact_with_scan(SIZE, &mut output, input));
    report(&timer, Some(kept == count && output[..kept] == expected[..count]));

    header("work-efficient compact, power-of-two");
    output.fill(0);
    let kept = efficient::compact(device, SIZE, &mut output, input, Some(&mut timer))?;
    report(&timer, Some(kept == count && output[..kept] == expected[..count]));

    header("work-efficient compact, non-power-of-two");
    output.fill(0);
    let kept = efficient::compact(device, NPOT, &mut output, input, Some(&mut timer))?;
    report(
        &timer,
        Some(kept == count_npot && output[..kept] == expected_npot[..count_npot]),
    );

    Ok(())
}

fn generate(rng: &mut StdRng, n: usize) -> Vec<i32> {
    (0..n).map(|_| rng.gen_range(0..MAX_VALUE)).collect()
}

fn header(name: &str) {
    println!("\n==== {name} ====");
}

fn report(timer: &PerformanceTimer, passed: Option<bool>) {
    if let Some(ms) = timer.elapsed_ms() {
        println!("    elapsed: {ms:.4} ms");
    }
    match passed {
        Some(true) => println!("    passed"),
        Some(false) => println!("    FAIL"),
        None => {}
    }
}

fn print_array(label: &str, values: &[i32]) {
    const SHOWN: usize = 16;
    let head: Vec<String> = values.iter().take(SHOWN).map(|v| v.to_string()).collect();
    if values.len() > SHOWN {
        println!("{label}: [{}, ... {}]", head.join(", "), values[values.len() - 1]);
    } else {
        println!("{label}: [{}]", head.join(", "));
    }
}
