use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ml_pca::{FitConfig, PcaMethod, PcaModel, PredictConfig};
use ndarray::{Array, Array2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

fn generate_data(n_samples: usize, n_features: usize) -> Array2<f64> {
    Array::random((n_samples, n_features), Uniform::new(0., 10.))
}

// One group per strategy so the reports line up shape by shape.
fn bench_pca_fit(c: &mut Criterion) {
    for method in [PcaMethod::Svd, PcaMethod::CovarianceMatrix, PcaMethod::Nipals] {
        let mut group = c.benchmark_group(format!("PCA_fit_{}", method));
        let config = FitConfig::new()
            .with_method(method)
            .with_scale(true)
            .with_n_comp_nipals(5);

        for &(n_samples, n_features) in [(100, 50), (500, 100), (100, 200)].iter() {
            let data = generate_data(n_samples, n_features);
            group.throughput(Throughput::Elements((n_samples * n_features) as u64));
            group.bench_with_input(
                BenchmarkId::new("fit", format!("{}x{}", n_samples, n_features)),
                &data,
                |b, data_matrix| {
                    b.iter(|| PcaModel::fit(data_matrix.view(), &config).unwrap());
                },
            );
        }
        group.finish();
    }
}

fn bench_pca_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("PCA_predict");

    for &(n_samples, n_features) in [(1000, 50), (5000, 100)].iter() {
        let training = generate_data(200, n_features);
        let pca = PcaModel::fit(training.view(), &FitConfig::new().with_scale(true)).unwrap();
        let data = generate_data(n_samples, n_features);
        let predict_config = PredictConfig::with_n_components(10);

        group.throughput(Throughput::Elements((n_samples * n_features) as u64));
        group.bench_with_input(
            BenchmarkId::new("predict", format!("{}x{}", n_samples, n_features)),
            &data,
            |b, data_matrix| {
                b.iter(|| pca.predict(data_matrix.view(), &predict_config).unwrap());
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_pca_fit, bench_pca_predict);
criterion_main!(benches);
