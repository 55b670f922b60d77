use super::dataset::Dataset;
use super::error::{Result,Error};


// Plot-ready view of one node under one graph kind; the only shape the
// presentation layer reads.
#[derive(Clone,Debug,PartialEq)]
pub struct GraphingData {
    pub x_axis_name: String,
    pub y_axis_name: String,
    pub chart_name: String,
    pub x_axis_labels: Vec<String>,
    pub y_axis_data: Vec<f64>,
    pub name: String,
}

#[derive(Clone,Copy,Debug,PartialEq)]
pub enum GraphKind {
    Daily,
    Change,
    Ratio,
    NewPerActive,
}

impl GraphKind {

    pub fn from_name(name: &str) -> Result<GraphKind> {
	match name {
	    "daily" => Ok(Self::Daily),
	    "change" => Ok(Self::Change),
	    "ratio" => Ok(Self::Ratio),
	    "new-per-active" => Ok(Self::NewPerActive),
	    _ => Err(Error::UnsupportedGraph(name.to_string())),
	}
    }

}

#[derive(Clone,Copy,Debug,PartialEq)]
pub enum DataKind {
    Confirmed,
    Recovered,
    Deaths,
    Active,
}

impl DataKind {

    pub fn from_name(name: &str) -> Result<DataKind> {
	match name {
	    "confirmed" => Ok(Self::Confirmed),
	    "recovered" => Ok(Self::Recovered),
	    "deaths" => Ok(Self::Deaths),
	    "active" => Ok(Self::Active),
	    _ => Err(Error::UnsupportedData(name.to_string())),
	}
    }

    pub fn name(&self) -> &'static str {
	match self {
	    Self::Confirmed => "confirmed",
	    Self::Recovered => "recovered",
	    Self::Deaths => "deaths",
	    Self::Active => "active",
	}
    }

}

#[derive(Clone,Copy,Debug)]
pub struct GraphOptions {
    pub per_capita: bool,
    pub smoothing: usize,
    pub offset100: bool,
}


impl Dataset {

    pub fn get_data(&self, graph: &str, data: &str, options: &GraphOptions) -> Result<GraphingData> {

	let graph = GraphKind::from_name(graph)?;
	let data = DataKind::from_name(data)?;

	let mut plot = match graph {
	    GraphKind::Daily => self.daily(data, options),
	    GraphKind::Change => self.change(data, options),
	    GraphKind::Ratio => self.ratio_smooth(data, options)?,
	    GraphKind::NewPerActive => self.new_per_active(options),
	};

	if options.offset100 {
	    self.offset100(&mut plot);
	}

	Ok(plot)

    }

    fn daily(&self, data: DataKind, options: &GraphOptions) -> GraphingData {
	let scale = self.scale(options);
	GraphingData {
	    x_axis_name: "Date".to_string(),
	    y_axis_name: format!("Daily {} cases", data.name()),
	    chart_name: format!("Total daily {} cases", data.name()),
	    x_axis_labels: self.date_labels(0),
	    y_axis_data: self.values(data).into_iter().map(|v| v * scale).collect(),
	    name: self.name.clone(),
	}
    }

    fn change(&self, data: DataKind, options: &GraphOptions) -> GraphingData {
	let scale = self.scale(options);
	let window = options.smoothing;
	let values = self.values(data);
	GraphingData {
	    x_axis_name: "Date".to_string(),
	    y_axis_name: format!("Change in {} cases", data.name()),
	    chart_name: format!("Change in daily {} cases ({} day average)", data.name(), window),
	    x_axis_labels: self.date_labels(window),
	    y_axis_data: (window..values.len()).map(
		|i| (values[i] - values[i - window]) / window as f64 * scale
	    ).collect(),
	    name: self.name.clone(),
	}
    }

    fn ratio_smooth(&self, data: DataKind, options: &GraphOptions) -> Result<GraphingData> {
	let window = options.smoothing;
	let values = self.values(data);
	// A zero baseline is a real degenerate case for early series and
	// has no meaningful growth figure.
	let ratios = (window..values.len()).map(|i| {
	    match values[i - window] == 0.0 {
		true => Err(Error::ZeroBaseline),
		false => Ok(100.0 * ((values[i] / values[i - window]).powf(1.0 / window as f64) - 1.0)),
	    }
	}).collect::<Result<_>>()?;
	Ok(GraphingData {
	    x_axis_name: "Date".to_string(),
	    y_axis_name: "Percent increase (%)".to_string(),
	    chart_name: format!("Daily % increase ({} day average)", window),
	    x_axis_labels: self.date_labels(window),
	    y_axis_data: ratios,
	    name: self.name.clone(),
	})
    }

    fn new_per_active(&self, options: &GraphOptions) -> GraphingData {
	let scale = self.scale(options);
	let confirmed = self.values(DataKind::Confirmed);
	let active = self.values(DataKind::Active);
	// Division by a zero active count yields a non-finite point; the
	// caller filters those instead of plotting them.
	let ratios = match confirmed.is_empty() {
	    true => Vec::new(),
	    false => std::iter::once(0.0).chain((1..confirmed.len()).map(
		|i| 100.0 * (confirmed[i] - confirmed[i - 1]) / active[i] * scale
	    )).collect(),
	};
	GraphingData {
	    x_axis_name: "Date".to_string(),
	    y_axis_name: "New confirmed per active case (%)".to_string(),
	    chart_name: "Daily new confirmed cases per active case".to_string(),
	    x_axis_labels: self.date_labels(0),
	    y_axis_data: ratios,
	    name: self.name.clone(),
	}
    }

    // Re-index from calendar dates to days since the node first reported
    // 100 confirmed cases. Runs after any of the graph kinds above.
    fn offset100(&self, plot: &mut GraphingData) {
	let skip = self.days_to_100.min(plot.y_axis_data.len());
	plot.y_axis_data.drain(..skip);
	plot.x_axis_labels = (0..plot.y_axis_data.len()).map(|i| i.to_string()).collect();
	plot.x_axis_name = "Days since 100th confirmed case".to_string();
    }

    fn scale(&self, options: &GraphOptions) -> f64 {
	match options.per_capita {
	    true => 1000.0 / self.population.count as f64,
	    false => 1.0,
	}
    }

    fn values(&self, data: DataKind) -> Vec<f64> {
	self.dates.iter().map(|date| {
	    let m = self.series.get(date).copied().unwrap_or_default();
	    match data {
		DataKind::Confirmed => m.confirmed as f64,
		DataKind::Recovered => m.recovered as f64,
		DataKind::Deaths => m.deaths as f64,
		DataKind::Active => m.active as f64,
	    }
	}).collect()
    }

    fn date_labels(&self, skip: usize) -> Vec<String> {
	self.dates.iter().skip(skip).map(
	    |date| format!("{}", date.format("%Y-%m-%d"))
	).collect()
    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use super::super::dataset::{Level,Measurement};
    use super::super::population::Population;
    use std::collections::BTreeMap;
    use chrono::Duration;
    use chrono::naive::NaiveDate;
    use approx::assert_relative_eq;

    fn node(counts: &[(u64,u64,u64)], population: u64) -> Dataset {
	let dates : Vec<NaiveDate> = (0..counts.len()).map(
	    |i| NaiveDate::from_ymd(2020, 1, 22) + Duration::days(i as i64)
	).collect();
	let series : BTreeMap<NaiveDate,Measurement> = dates.iter().cloned().zip(
	    counts.iter().map(|(confirmed,recovered,deaths)| Measurement {
		confirmed: *confirmed,
		recovered: *recovered,
		deaths: *deaths,
		active: 0,
	    })
	).collect();
	let mut node = Dataset {
	    name: "Testland".to_string(),
	    parent: Some("Global".to_string()),
	    level: Level::Country,
	    dates,
	    series,
	    subsets: Vec::new(),
	    population: Population::known(population),
	    total_confirmed: 0,
	    total_confirmed_per_capita: 0.0,
	    days_to_100: 0,
	};
	node.analyze();
	node
    }

    fn confirmed_node(confirmed: &[u64]) -> Dataset {
	node(&confirmed.iter().map(|c| (*c, 0, 0)).collect::<Vec<_>>(), 1000)
    }

    fn absolute(smoothing: usize) -> GraphOptions {
	GraphOptions { per_capita: false, smoothing, offset100: false }
    }

    #[test]
    fn daily_returns_the_raw_series_when_absolute() {
	let node = confirmed_node(&[10, 20, 50, 90, 120, 150]);
	let plot = node.get_data("daily", "confirmed", &absolute(1)).unwrap();
	assert_eq!(plot.y_axis_data, vec![10.0, 20.0, 50.0, 90.0, 120.0, 150.0]);
	assert_eq!(plot.x_axis_labels[0], "2020-01-22");
	assert_eq!(plot.x_axis_name, "Date");
	assert_eq!(plot.name, "Testland");
    }

    #[test]
    fn daily_per_capita_scales_by_population() {
	let node = node(&[(10,0,0), (20,0,0)], 2000);
	let options = GraphOptions { per_capita: true, smoothing: 1, offset100: false };
	let plot = node.get_data("daily", "confirmed", &options).unwrap();
	assert_eq!(plot.y_axis_data, vec![5.0, 10.0]);
    }

    #[test]
    fn change_is_a_windowed_first_difference() {
	let node = confirmed_node(&[10, 20, 50, 90, 120, 150]);
	let plot = node.get_data("change", "confirmed", &absolute(3)).unwrap();
	assert_eq!(plot.y_axis_data.len(), 3);
	assert_relative_eq!(plot.y_axis_data[0], 80.0 / 3.0);
	assert_relative_eq!(plot.y_axis_data[1], 100.0 / 3.0);
	assert_relative_eq!(plot.y_axis_data[2], 100.0 / 3.0);
	assert_eq!(plot.x_axis_labels[0], "2020-01-25");
    }

    #[test]
    fn change_with_window_past_the_series_is_empty() {
	let node = confirmed_node(&[10, 20, 50]);
	assert!(node.get_data("change", "confirmed", &absolute(3)).unwrap().y_axis_data.is_empty());
	assert!(node.get_data("change", "confirmed", &absolute(10)).unwrap().y_axis_data.is_empty());
    }

    #[test]
    fn ratio_is_geometric_mean_growth() {
	let node = confirmed_node(&[100, 200, 400]);
	let plot = node.get_data("ratio", "confirmed", &absolute(1)).unwrap();
	assert_eq!(plot.y_axis_data.len(), 2);
	assert_relative_eq!(plot.y_axis_data[0], 100.0);
	assert_relative_eq!(plot.y_axis_data[1], 100.0);
	let plot = node.get_data("ratio", "confirmed", &absolute(2)).unwrap();
	assert_eq!(plot.y_axis_data.len(), 1);
	assert_relative_eq!(plot.y_axis_data[0], 100.0);
    }

    #[test]
    fn ratio_with_a_zero_baseline_is_an_error() {
	let node = confirmed_node(&[0, 10, 20]);
	match node.get_data("ratio", "confirmed", &absolute(1)) {
	    Err(Error::ZeroBaseline) => (),
	    other => panic!("expected ZeroBaseline, got {:?}", other.map(|_| ())),
	}
    }

    #[test]
    fn new_per_active_pins_the_first_point_at_zero() {
	let node = node(&[(100,60,20), (150,70,30)], 1000);
	let plot = node.get_data("new-per-active", "confirmed", &absolute(1)).unwrap();
	assert_eq!(plot.y_axis_data[0], 0.0);
	assert_relative_eq!(plot.y_axis_data[1], 100.0 * 50.0 / 50.0);
    }

    #[test]
    fn new_per_active_surfaces_nonfinite_on_zero_active() {
	let node = node(&[(100,60,20), (150,100,50)], 1000);
	let plot = node.get_data("new-per-active", "confirmed", &absolute(1)).unwrap();
	assert!(!plot.y_axis_data[1].is_finite());
    }

    #[test]
    fn offset100_relabels_from_zero() {
	let node = confirmed_node(&[10, 20, 50, 90, 120, 150]);
	assert_eq!(node.days_to_100, 4);
	let options = GraphOptions { per_capita: false, smoothing: 1, offset100: true };
	let plot = node.get_data("daily", "confirmed", &options).unwrap();
	assert_eq!(plot.y_axis_data, vec![120.0, 150.0]);
	assert_eq!(plot.x_axis_labels, vec!["0", "1"]);
	assert_eq!(plot.x_axis_name, "Days since 100th confirmed case");
    }

    #[test]
    fn offset100_applies_after_the_window_shrinks_the_series() {
	let node = confirmed_node(&[10, 20, 50, 90, 120, 150]);
	let options = GraphOptions { per_capita: false, smoothing: 3, offset100: true };
	let plot = node.get_data("change", "confirmed", &options).unwrap();
	assert!(plot.y_axis_data.is_empty());
	assert!(plot.x_axis_labels.is_empty());
    }

    #[test]
    fn unknown_graph_kind_is_rejected() {
	let node = confirmed_node(&[10, 20]);
	match node.get_data("cubic", "confirmed", &absolute(1)) {
	    Err(Error::UnsupportedGraph(name)) => assert_eq!(name, "cubic"),
	    other => panic!("expected UnsupportedGraph, got {:?}", other.map(|_| ())),
	}
    }

    #[test]
    fn unknown_data_kind_is_rejected() {
	let node = confirmed_node(&[10, 20]);
	match node.get_data("daily", "llamas", &absolute(1)) {
	    Err(Error::UnsupportedData(name)) => assert_eq!(name, "llamas"),
	    other => panic!("expected UnsupportedData, got {:?}", other.map(|_| ())),
	}
    }

}
