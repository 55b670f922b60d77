use std::collections::BTreeMap;

use chrono::naive::NaiveDate;
use serde::{Serialize,Deserialize};

use super::error::{Result,Error};
use super::population::{Population,Populations,GlobalPopulation};


pub const CASE_THRESHOLD: u64 = 100;

// Some national feeds emit a duplicate row mislabeled as a province
// named "Recovered"; it never describes a real region.
const RECOVERED_SENTINEL: &str = "Recovered";


#[derive(Clone,Copy,Debug,Default,PartialEq)]
pub struct Measurement {
    pub confirmed: u64,
    pub recovered: u64,
    pub deaths: u64,
    // confirmed - recovered - deaths; negative when the source data is
    // inconsistent, which happens and is kept as-is.
    pub active: i64,
}

#[derive(Clone,Copy,Debug,PartialEq)]
pub enum Level {
    Global,
    Country,
    Region,
}

impl Level {

    fn child(&self) -> Level {
	match self {
	    Self::Global => Self::Country,
	    Self::Country => Self::Region,
	    Self::Region => Self::Region,
	}
    }

}


// Nested ingestion shape: one record per region, children keyed by name.
#[derive(Deserialize,Debug)]
pub struct RawRegion {
    pub name: String,
    #[serde(default)]
    pub data: BTreeMap<String,RawDay>,
    #[serde(default)]
    pub subsets: BTreeMap<String,RawRegion>,
}

#[derive(Deserialize,Debug)]
pub struct RawDay {
    pub confirmed: u64,
    pub recovered: u64,
    pub deaths: u64,
}

// Flat ingestion shape: one row per (country, province) pair, one value
// per date column of the parallel header.
#[derive(Serialize,Deserialize,Clone,Debug)]
pub struct Table {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<Row>,
}

#[derive(Serialize,Deserialize,Clone,Debug)]
pub struct Row {
    pub province: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub values: Vec<u64>,
}


#[derive(Clone,Debug,PartialEq)]
pub struct Dataset {
    pub name: String,
    pub parent: Option<String>,
    pub level: Level,
    pub dates: Vec<NaiveDate>,
    pub series: BTreeMap<NaiveDate,Measurement>,
    pub subsets: Vec<Dataset>,
    pub population: Population,
    pub total_confirmed: u64,
    pub total_confirmed_per_capita: f64,
    pub days_to_100: usize,
}

impl Dataset {

    fn new(name: String, parent: Option<String>, level: Level) -> Self {
	Dataset {
	    name,
	    parent,
	    level,
	    dates: Vec::new(),
	    series: BTreeMap::new(),
	    subsets: Vec::new(),
	    population: Population::known(0),
	    total_confirmed: 0,
	    total_confirmed_per_capita: 0.0,
	    days_to_100: 0,
	}
    }

    pub fn from_nested(raw: RawRegion, populations: &Populations) -> Result<Dataset> {
	let mut globe = GlobalPopulation::new();
	let mut root = Self::build(raw, None, Level::Global, populations, &mut globe)?;
	root.population = globe.finish();
	root.analyze();
	Ok(root)
    }

    fn build(raw: RawRegion, parent: Option<&str>, level: Level,
	     populations: &Populations, globe: &mut GlobalPopulation) -> Result<Dataset> {

	let mut node = Dataset::new(raw.name, parent.map(str::to_string), level);

	if raw.subsets.is_empty() {
	    for (day,counts) in raw.data {
		node.series.insert(parse_day(&day)?, Measurement {
		    confirmed: counts.confirmed,
		    recovered: counts.recovered,
		    deaths: counts.deaths,
		    active: 0,
		});
	    }
	} else {
	    for (_,raw_child) in raw.subsets {
		let child = Self::build(raw_child, Some(&node.name), level.child(),
					populations, globe)?;
		node.absorb(child, populations, globe);
	    }
	}

	node.finish(populations);
	Ok(node)

    }

    pub fn from_tables(confirmed: &Table, deaths: &Table, recovered: &Table,
		       populations: &Populations) -> Result<Dataset> {

	if deaths.dates != confirmed.dates || recovered.dates != confirmed.dates {
	    return Err(Error::FeedMismatch);
	}

	fn fill(leaves: &mut BTreeMap<String,BTreeMap<String,Vec<Measurement>>>,
		table: &Table, set: fn(&mut Measurement, u64)) {
	    for row in &table.rows {
		let name = match row.province.is_empty() {
		    true => row.country.clone(),
		    false => row.province.clone(),
		};
		let series = leaves.entry(row.country.clone()).or_insert_with(BTreeMap::new)
		    .entry(name).or_insert_with(|| vec![Measurement::default(); table.dates.len()]);
		for (slot,value) in series.iter_mut().zip(&row.values) {
		    set(slot, *value);
		}
	    }
	}

	let mut leaves = BTreeMap::new();
	fill(&mut leaves, confirmed, |m,v| m.confirmed += v);
	fill(&mut leaves, deaths, |m,v| m.deaths += v);
	fill(&mut leaves, recovered, |m,v| m.recovered += v);

	let mut globe = GlobalPopulation::new();
	let mut root = Dataset::new("Global".to_string(), None, Level::Global);

	for (country,regions) in leaves {
	    let mut node = Dataset::new(country.clone(), Some(root.name.clone()), Level::Country);
	    for (name,values) in regions {
		let mut leaf = Dataset::new(name, Some(country.clone()), Level::Region);
		leaf.series = confirmed.dates.iter().cloned().zip(values).collect();
		leaf.finish(populations);
		node.absorb(leaf, populations, &mut globe);
	    }
	    node.finish(populations);
	    root.absorb(node, populations, &mut globe);
	}

	root.finish(populations);
	root.population = globe.finish();
	root.analyze();
	Ok(root)

    }

    fn absorb(&mut self, child: Dataset, populations: &Populations, globe: &mut GlobalPopulation) {

	if child.name == RECOVERED_SENTINEL {
	    return;
	}

	// Some countries report one row at the national level with no
	// province; it folds into the total without becoming a child.
	if child.name == self.name {
	    self.add_series(&child.series);
	    return;
	}

	if child.total_confirmed == 0 {
	    return;
	}

	self.add_series(&child.series);
	if let Level::Global = self.level {
	    globe.register(populations, &child.name);
	}
	self.subsets.push(child);

    }

    fn add_series(&mut self, series: &BTreeMap<NaiveDate,Measurement>) {
	for (date,m) in series {
	    let own = self.series.entry(*date).or_insert_with(Measurement::default);
	    own.confirmed += m.confirmed;
	    own.recovered += m.recovered;
	    own.deaths += m.deaths;
	}
    }

    fn finish(&mut self, populations: &Populations) {
	self.dates = self.series.keys().cloned().collect();
	self.population = match &self.level {
	    // Set from the registration pass once all countries are in.
	    Level::Global => Population::known(0),
	    Level::Country => populations.country(&self.name),
	    Level::Region => populations.region(self.parent.as_deref().unwrap_or(""), &self.name),
	};
	self.analyze();
    }

    pub fn analyze(&mut self) {
	for m in self.series.values_mut() {
	    m.active = m.confirmed as i64 - m.recovered as i64 - m.deaths as i64;
	}
	self.total_confirmed = self.dates.last()
	    .and_then(|date| self.series.get(date))
	    .map_or(0, |m| m.confirmed);
	self.total_confirmed_per_capita =
	    1000.0 * self.total_confirmed as f64 / self.population.count as f64;
	self.days_to_100 = self.dates.iter().position(
	    |date| self.series.get(date).map_or(false, |m| m.confirmed >= CASE_THRESHOLD)
	).unwrap_or(self.dates.len());
    }

}


fn parse_day(day: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
	.or_else(|_| NaiveDate::parse_from_str(day, "%m/%d/%y"))
	.map_err(Error::from)
}
