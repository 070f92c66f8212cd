// benches/codec_benchmark.rs
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ipw_rs::*;
use ndarray::Array2;

fn snow_grid(side: usize) -> Grid {
    let bands: Vec<(&str, ByteWidth)> = ["z_s", "rho", "m_s", "h2o", "T_s_0", "T_s_l", "T_s", "z_s_l", "h2o_sat"]
        .iter()
        .map(|name| (*name, ByteWidth::Two))
        .collect();
    let data = Array2::from_shape_fn((side * side, bands.len()), |(p, b)| {
        ((p * 31 + b * 7) % 1000) as f64 * 0.1
    });
    Grid::from_array(FileType::Snow, &bands, side, side, data).unwrap()
}

fn benchmark_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_snow");

    for side in [64, 256, 512].iter() {
        let grid = snow_grid(*side);
        group.throughput(Throughput::Bytes(grid.header().payload_size() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(side), &grid, |b, grid| {
            b.iter(|| grid.write().unwrap());
        });
    }

    group.finish();
}

fn benchmark_parse_and_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_snow");
    let config = IpwConfig::default();

    for side in [64, 256, 512].iter() {
        let grid = snow_grid(*side);
        let bytes = grid.write().unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(side), &bytes, |b, bytes| {
            b.iter(|| {
                let grid = Grid::from_bytes(bytes.clone(), FileType::Snow, &config).unwrap();
                grid.data().unwrap().nrows()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_write, benchmark_parse_and_decode);
criterion_main!(benches);
