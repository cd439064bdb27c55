use std::collections::BTreeMap;

use serde_json::json;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::data::parse_freq;
use crate::dataset::{boundary_sequences, time_train_test_split};
use crate::error::Result;
use crate::experiment::ExperimentTracker;
use crate::features::FeatureFrame;
use crate::metrics::{evaluate, EvalMetrics};
use crate::models::{persistence, ForestModel, ModelKind, RecurrentModel, SarimaModel};

/// Truthy values of the fast-test toggle, which skips every family except
/// the persistence baseline.
pub fn fast_test_enabled() -> bool {
    matches!(
        std::env::var("FAST_TEST").as_deref(),
        Ok("1") | Ok("true") | Ok("True")
    )
}

/// Train all enabled model families on the persisted feature frame and
/// write the metrics summary.
///
/// The statistical family is allowed to fail (logged and skipped); the
/// tree and sequence families propagate errors.
pub fn run_training(cfg: &Config, fast_test: bool) -> Result<BTreeMap<String, EvalMetrics>> {
    let frame = FeatureFrame::read_csv(&cfg.paths.features_file)?;
    let freq = parse_freq(&cfg.data.resample_freq)?;
    let (train_df, test_df) =
        time_train_test_split(&frame, cfg.training.test_size_days, freq)?;
    info!(
        train_rows = train_df.len(),
        test_rows = test_df.len(),
        "temporal split"
    );

    let (x_train, y_train, x_cols) = train_df.split_xy(&cfg.training.target_col)?;
    let (x_test, y_test, _) = test_df.split_xy(&cfg.training.target_col)?;

    let tracker = ExperimentTracker::init(cfg)?;
    let mut results = BTreeMap::new();

    // persistence baseline: pure shift-and-fill, never fails
    let preds = persistence::one_step_naive(&y_test);
    let mm = evaluate(&y_test, &preds)?;
    tracker.log_run(
        "persistence",
        "Naive previous-value baseline",
        json!({}),
        &mm,
    )?;
    info!(rmse = mm.rmse, mae = mm.mae, mape = mm.mape, "persistence metrics");
    results.insert(ModelKind::Persistence.to_string(), mm);

    if fast_test {
        warn!("fast-test mode: skipping statistical, forest and recurrent families");
    } else {
        if cfg.models.sarima.enabled {
            // a degenerate statistical fit must not abort the run
            match train_sarima(cfg, &y_train, &y_test, &tracker) {
                Ok(mm) => {
                    results.insert(ModelKind::Sarima.to_string(), mm);
                }
                Err(e) => error!(error = %e, "statistical model failed; skipping"),
            }
        }

        if cfg.models.forest.enabled {
            let model =
                ForestModel::train(&x_train, &y_train, &cfg.models.forest, x_cols.clone())?;
            let preds = model.predict_rows(&x_test)?;
            let mm = evaluate(&y_test, &preds)?;
            model.save(&cfg.paths.models_dir.join("forest.bin"))?;
            tracker.log_run(
                "forest",
                "Tree-ensemble regressor on lag/time features",
                json!({
                    "n_trees": cfg.models.forest.n_trees,
                    "max_depth": cfg.models.forest.max_depth,
                    "min_samples_split": cfg.models.forest.min_samples_split,
                }),
                &mm,
            )?;
            info!(rmse = mm.rmse, mae = mm.mae, mape = mm.mape, "forest metrics");
            results.insert(ModelKind::Forest.to_string(), mm);
        }

        if cfg.models.recurrent.enabled {
            let seqs = boundary_sequences(
                &x_train,
                &y_train,
                &x_test,
                &y_test,
                cfg.training.lookback,
            );
            let model = RecurrentModel::train(
                &seqs.train_windows,
                &seqs.train_labels,
                &cfg.models.recurrent,
                x_cols.clone(),
            )?;
            let preds = model.predict_windows(&seqs.test_windows)?;
            let mm = evaluate(&seqs.test_labels, &preds)?;
            model.save(&cfg.paths.models_dir.join("recurrent.json"))?;
            tracker.log_run(
                "recurrent",
                "Sequence model on sliding lookback windows",
                json!({
                    "lookback": cfg.training.lookback,
                    "epochs": cfg.models.recurrent.epochs,
                    "learning_rate": cfg.models.recurrent.learning_rate,
                }),
                &mm,
            )?;
            info!(rmse = mm.rmse, mae = mm.mae, mape = mm.mape, "recurrent metrics");
            results.insert(ModelKind::Recurrent.to_string(), mm);
        }
    }

    let summary_path = cfg.paths.metrics_summary_file();
    if let Some(parent) = summary_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&summary_path, serde_json::to_vec_pretty(&results)?)?;
    info!(path = %summary_path.display(), "saved metrics summary");
    Ok(results)
}

fn train_sarima(
    cfg: &Config,
    y_train: &[f64],
    y_test: &[f64],
    tracker: &ExperimentTracker,
) -> Result<EvalMetrics> {
    let model = SarimaModel::fit(y_train, &cfg.models.sarima)?;
    let preds = model.forecast(y_test.len())?;
    let mm = evaluate(y_test, &preds)?;
    model.save(&cfg.paths.models_dir.join("sarima.json"))?;
    tracker.log_run(
        "sarima",
        "Seasonal autoregression with differencing",
        json!({
            "order": cfg.models.sarima.order,
            "seasonal_order": cfg.models.sarima.seasonal_order,
        }),
        &mm,
    )?;
    info!(rmse = mm.rmse, mae = mm.mae, mape = mm.mape, "sarima metrics");
    Ok(mm)
}
