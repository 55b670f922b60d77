use std::{fs,io};
use std::fs::File;
use std::path::Path;
use std::time::Duration;

use chrono::naive::NaiveDate;

use super::error::{Result,Error};
use super::dataset::{Table,Row};


const PROVINCE_COLUMN: usize = 0;
const COUNTRY_COLUMN: usize = 1;
const LATITUDE_COLUMN: usize = 2;
const LONGITUDE_COLUMN: usize = 3;
const DATA_START_COLUMN: usize = 4;


pub fn confirmed(cache_path: &Path) -> Result<Table> {
    feed(cache_path, "confirmed")
}

pub fn deaths(cache_path: &Path) -> Result<Table> {
    feed(cache_path, "deaths")
}

pub fn recovered(cache_path: &Path) -> Result<Table> {
    feed(cache_path, "recovered")
}


fn feed(cache_path: &Path, kind: &str) -> Result<Table> {

    let cache_path = cache_path.join("csse");
    let cache_file = cache_path.join(format!("{}.json", kind));

    if cache_file.exists() && fs::metadata(&cache_file)?.modified()?.elapsed()? < Duration::new(1800,0) {
	let contents = serde_json::from_reader::<_,Table>(
	    io::BufReader::new(File::open(&cache_file)?));
	if let Ok(cached) = contents {
	    return Ok(cached);
	}
    }

    let data = download(kind)?;
    fs::create_dir_all(&cache_path)?;
    serde_json::to_writer(io::BufWriter::new(File::create(cache_file)?), &data)?;
    Ok(data)

}


fn download(kind: &str) -> Result<Table> {
    println!("Downloading time_series_covid19_{}_global.csv...", kind);
    let res = reqwest::blocking::get(&format!(
	"https://raw.githubusercontent.com/CSSEGISandData/COVID-19\
	 /master/csse_covid_19_data/csse_covid_19_time_series\
	 /time_series_covid19_{}_global.csv", kind))?;
    match res.status().as_u16() {
	200 => parse(res.text()?.as_bytes()),
	_ => Err(Error::HttpError(res.status())),
    }
}


pub fn parse<R: io::Read>(input: R) -> Result<Table> {

    let mut reader = csv::Reader::from_reader(input);

    let dates = reader.headers()?.iter().skip(DATA_START_COLUMN).map(
	|label| NaiveDate::parse_from_str(label, "%m/%d/%y").map_err(Error::from)
    ).collect::<Result<_>>()?;

    let rows = reader.into_records().map(|record| {
	let record = record?;
	Ok(Row {
	    province: record.get(PROVINCE_COLUMN).unwrap_or("").to_string(),
	    country: record.get(COUNTRY_COLUMN).unwrap_or("").to_string(),
	    latitude: record.get(LATITUDE_COLUMN).unwrap_or("").parse().unwrap_or(0.0),
	    longitude: record.get(LONGITUDE_COLUMN).unwrap_or("").parse().unwrap_or(0.0),
	    values: record.iter().skip(DATA_START_COLUMN)
		.map(|value| value.parse().map_err(Error::from))
		.collect::<Result<_>>()?,
	})
    }).collect::<Result<_>>()?;

    Ok(Table { dates, rows })

}


#[cfg(test)]
mod tests {

    use super::*;

    const FEED: &str = "\
Province/State,Country/Region,Lat,Long,1/22/20,1/23/20,2/1/20
Ontario,Canada,51.2538,-85.3232,120,150,180
,France,46.2276,2.2137,200,300,400
";

    #[test]
    fn header_dates_reformat_to_calendar_days() {
	let table = parse(FEED.as_bytes()).unwrap();
	assert_eq!(table.dates, vec![NaiveDate::from_ymd(2020, 1, 22),
				     NaiveDate::from_ymd(2020, 1, 23),
				     NaiveDate::from_ymd(2020, 2, 1)]);
    }

    #[test]
    fn rows_split_on_the_positional_columns() {
	let table = parse(FEED.as_bytes()).unwrap();
	assert_eq!(table.rows.len(), 2);
	assert_eq!(table.rows[0].province, "Ontario");
	assert_eq!(table.rows[0].country, "Canada");
	assert_eq!(table.rows[0].values, vec![120, 150, 180]);
	assert_eq!(table.rows[1].province, "");
	assert_eq!(table.rows[1].country, "France");
	assert_eq!(table.rows[1].values, vec![200, 300, 400]);
    }

    #[test]
    fn bad_counts_are_reported() {
	let feed = "Province/State,Country/Region,Lat,Long,1/22/20\n,France,0,0,many\n";
	match parse(feed.as_bytes()) {
	    Err(Error::ParseInt(_)) => (),
	    other => panic!("expected ParseInt, got {:?}", other.map(|_| ())),
	}
    }

}
