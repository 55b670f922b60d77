use std::{fs,io};
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use std::collections::{HashMap,HashSet};

use lazy_static::lazy_static;
use serde::{Serialize,Deserialize};
use tracing::warn;

use super::error::{Result,Error};


// Not a great stand-in, but it keeps per-capita graphs usable for
// countries with no population data.
pub const DEFAULT_POPULATION: u64 = 1000;

lazy_static! {

    // The John Hopkins boundaries/names don't line up well with the
    // population table, so these are set by hand.
    static ref OVERRIDES: HashMap<&'static str,u64> = vec![
	("Serbia", 6963764),
	("Russia", 146745098),
	("Montenegro", 631219),
	("Kosovo", 1810463),
	("Congo (Kinshasa)", 11855000),
	("Congo (Brazzaville)", 5244369),
	("Taiwan*", 23780542),
	("Diamond Princess", 3711),
	("MS Zaandam", 1829),
	("West Bank and Gaza", 3340143),
    ].into_iter().collect();

    // These names don't line up nicely between the two sources.
    static ref TRANSLATIONS: HashMap<&'static str,&'static str> = vec![
	("US", "United States"),
	("Holy See", "Holy See (Vatican City State)"),
	("Timor-Leste", "East Timor"),
	("Sri Lanka", "SriLanka"),
	("Libya", "Libyan Arab Jamahiriya"),
	("Korea, South", "South Korea"),
	("Fiji", "Fiji Islands"),
	("Eswatini", "Swaziland"),
	("Czechia", "Czech Republic"),
	("Cote d'Ivoire", "Ivory Coast"),
	("Cabo Verde", "Cape Verde"),
	("Burma", "Myanmar"),
    ].into_iter().collect();

    // https://en.wikipedia.org/wiki/Population_of_Canada_by_province_and_territory
    // April 27, 2020
    static ref REGIONS: HashMap<&'static str,HashMap<&'static str,u64>> = vec![
	("Canada", vec![
	    ("Alberta", 4067175),
	    ("British Columbia", 4648055),
	    ("Manitoba", 1278365),
	    ("New Brunswick", 747101),
	    ("Newfoundland and Labrador", 519716),
	    ("Northwest Territories", 41786),
	    ("Nova Scotia", 923598),
	    ("Ontario", 13448494),
	    ("Prince Edward Island", 142907),
	    ("Quebec", 8164361),
	    ("Saskatchewan", 1098352),
	    ("Yukon", 35874),
	].into_iter().collect()),
    ].into_iter().collect();

}


#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Population {
    pub count: u64,
    pub substituted: bool,
}

impl Population {

    pub fn known(count: u64) -> Self {
	Population { count, substituted: false }
    }

    pub fn missing() -> Self {
	Population { count: DEFAULT_POPULATION, substituted: true }
    }

}


#[derive(Serialize,Deserialize,Debug)]
pub struct CountryRow {
    pub country: String,
    pub population: Option<u64>,
}


pub struct Populations {
    countries: HashMap<String,u64>,
}

impl Populations {

    pub fn new(rows: Vec<CountryRow>) -> Self {
	Populations {
	    countries: rows.into_iter().filter_map(
		|row| row.population.map(|count| (row.country, count))
	    ).collect()
	}
    }

    pub fn country(&self, name: &str) -> Population {
	if let Some(count) = OVERRIDES.get(name) {
	    return Population::known(*count);
	}
	let table_name = TRANSLATIONS.get(name).copied().unwrap_or(name);
	match self.countries.get(table_name) {
	    Some(count) => Population::known(*count),
	    None => {
		warn!("missing population for country '{}'", name);
		Population::missing()
	    }
	}
    }

    pub fn region(&self, country: &str, region: &str) -> Population {
	match REGIONS.get(country).and_then(|regions| regions.get(region)) {
	    Some(count) => Population::known(*count),
	    None => {
		warn!("missing population for region '{}' in country '{}'", region, country);
		Population::missing()
	    }
	}
    }

}


// The global population only includes countries that report data,
// otherwise per-capita values would be even more skewed than they
// already are by testing variations. Every top-level country is
// registered exactly once during tree construction; the total is
// only handed out once registration is finished.
pub struct GlobalPopulation {
    members: HashSet<String>,
    total: u64,
}

impl GlobalPopulation {

    pub fn new() -> Self {
	GlobalPopulation { members: HashSet::new(), total: 0 }
    }

    pub fn register(&mut self, populations: &Populations, country: &str) {
	if !self.members.insert(country.to_string()) {
	    return;
	}
	self.total += populations.country(country).count;
    }

    pub fn finish(self) -> Population {
	Population::known(self.total)
    }

}


pub fn fetch(cache_path: &Path) -> Result<Vec<CountryRow>> {

    let cache_file = cache_path.join("populations.json");

    if cache_file.exists() && fs::metadata(&cache_file)?.modified()?.elapsed()? < Duration::new(86400,0) {
	let contents = serde_json::from_reader::<_,Vec<CountryRow>>(
	    io::BufReader::new(File::open(&cache_file)?));
	if let Ok(cached) = contents {
	    return Ok(cached);
	}
    }

    let data = download()?;
    fs::create_dir_all(&cache_path)?;
    serde_json::to_writer(io::BufWriter::new(File::create(cache_file)?), &data)?;
    Ok(data)

}


fn download() -> Result<Vec<CountryRow>> {
    println!("Downloading country-by-population.json...");
    let res = reqwest::blocking::get("https://raw.githubusercontent.com/samayo/country-json\
				      /master/src/country-by-population.json")?;
    match res.status().as_u16() {
	200 => Ok(serde_json::from_str(&res.text()?)?),
	_ => Err(Error::HttpError(res.status())),
    }
}
