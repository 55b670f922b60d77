mod error;
mod population;
mod dataset;
mod metrics;
mod csse;
mod graph;

use std::fs;
use std::path::{PathBuf,Path};
use std::thread;

use tracing::warn;
use unidecode::unidecode;

use error::{Result,Error};
use dataset::Dataset;
use metrics::{GraphOptions,GraphingData};
use population::Populations;


const DEFAULT_COUNTRIES: [&str; 6] = ["Canada", "France", "Italy", "Spain", "US", "United Kingdom"];


fn main() -> Result<()> {

    tracing_subscriber::fmt::init();

    let graph_path = PathBuf::from("graphs");
    let cache_path = PathBuf::from("cache");

    fs::create_dir_all(&graph_path)?;

    let root = fetch_and_build(&cache_path)?;

    if let Err(err) = country_graphs(&graph_path, &root) {
	eprintln!("Error: country graphs: {}", err);
    }

    if let Err(err) = region_graphs(&graph_path, &root, "Canada") {
	eprintln!("Error: Canada region graphs: {}", err);
    }

    if let Err(err) = global_graphs(&graph_path, &root) {
	eprintln!("Error: global graphs: {}", err);
    }

    Ok(())

}


// The tree may only be built once every feed has landed; each download
// runs on its own thread and all four handles are joined first.
fn fetch_and_build(cache_path: &Path) -> Result<Dataset> {

    let confirmed = spawn_fetch(cache_path, csse::confirmed);
    let deaths = spawn_fetch(cache_path, csse::deaths);
    let recovered = spawn_fetch(cache_path, csse::recovered);
    let countries = spawn_fetch(cache_path, population::fetch);

    let confirmed = confirmed.join().map_err(|_| Error::FeedPanicked)??;
    let deaths = deaths.join().map_err(|_| Error::FeedPanicked)??;
    let recovered = recovered.join().map_err(|_| Error::FeedPanicked)??;
    let populations = Populations::new(countries.join().map_err(|_| Error::FeedPanicked)??);

    Dataset::from_tables(&confirmed, &deaths, &recovered, &populations)

}

fn spawn_fetch<T, F>(cache_path: &Path, fetch: F) -> thread::JoinHandle<Result<T>>
where T: Send + 'static, F: FnOnce(&Path) -> Result<T> + Send + 'static {
    let path = cache_path.to_path_buf();
    thread::spawn(move || fetch(&path))
}


fn country_graphs(graph_path: &Path, root: &Dataset) -> Result<()> {

    let countries = DEFAULT_COUNTRIES.iter().map(
	|&name| root.subsets.iter().find(|country| country.name == name)
	    .ok_or(Error::MissingRegion(name))
    ).collect::<Result<Vec<_>>>()?;

    comparison_charts(graph_path, "countries", &countries)

}

fn region_graphs(graph_path: &Path, root: &Dataset, country: &'static str) -> Result<()> {

    let node = root.subsets.iter().find(|c| c.name == country)
	.ok_or(Error::MissingRegion(country))?;

    comparison_charts(graph_path, &format!("regions/{}", unidecode(&node.name).to_lowercase()),
		      &node.subsets.iter().collect())

}

fn global_graphs(graph_path: &Path, root: &Dataset) -> Result<()> {
    comparison_charts(graph_path, "global", &vec![root])
}


fn comparison_charts(graph_path: &Path, group: &str, nodes: &Vec<&Dataset>) -> Result<()> {

    let smoothings = vec![7, 14];

    for per_capita in vec![false, true] {

	for offset100 in vec![false, true] {

	    let subdir = graph_path.join(group).join(match (per_capita, offset100) {
		(false, false) => "absolute",
		(false, true) => "absolute-offset",
		(true, false) => "per-capita",
		(true, true) => "per-capita-offset",
	    });

	    for data in vec!["confirmed", "active", "deaths"] {

		chart(&subdir, &format!("daily-{}.html", data), nodes,
		      "daily", data, &GraphOptions { per_capita, smoothing: 1, offset100 })?;

		for smoothing in &smoothings {
		    chart(&subdir, &format!("change-{}-{}days.html", data, smoothing), nodes,
			  "change", data, &GraphOptions { per_capita, smoothing: *smoothing, offset100 })?;
		}

	    }

	    for smoothing in &smoothings {
		chart(&subdir, &format!("ratio-confirmed-{}days.html", smoothing), nodes,
		      "ratio", "confirmed", &GraphOptions { per_capita, smoothing: *smoothing, offset100 })?;
	    }

	    chart(&subdir, "new-per-active.html", nodes,
		  "new-per-active", "confirmed", &GraphOptions { per_capita, smoothing: 1, offset100 })?;

	}

    }

    Ok(())

}

// A region whose transform degenerates (e.g. a zero growth baseline)
// is skipped with a warning rather than sinking the whole chart.
fn chart(subdir: &Path, filename: &str, nodes: &Vec<&Dataset>,
	 kind: &str, data: &str, options: &GraphOptions) -> Result<()> {

    let plots : Vec<GraphingData> = nodes.iter().filter_map(
	|node| match node.get_data(kind, data, options) {
	    Ok(plot) => Some(plot),
	    Err(err) => {
		warn!("no {} {} plot for {}: {}", kind, data, node.name, err);
		None
	    }
	}
    ).collect();

    graph::comparison_graph(subdir, filename, &plots)

}
